use anyhow::{Context, Result};
use gc_core::error::EngineError;
use gc_core::frame::PixelBuffer;
use std::io::{Read, Write};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

/// Chunks MP4 accumulés pendant une session d'enregistrement.
///
/// Les chunks vides sont jetés à l'arrivée ; `finalize` concatène le
/// reste en un seul blob prêt à écrire sur disque.
///
/// # Example
/// ```
/// use gc_export::recorder::RecordingSession;
/// let mut session = RecordingSession::new();
/// session.push_chunk(Vec::new());
/// session.push_chunk(vec![1, 2, 3]);
/// assert_eq!(session.chunk_count(), 1);
/// assert_eq!(session.finalize(), vec![1, 2, 3]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingSession {
    chunks: Vec<Vec<u8>>,
}

impl RecordingSession {
    /// Session vide.
    #[must_use]
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Ajoute un chunk encodé ; les chunks vides sont ignorés.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.chunks.push(chunk);
    }

    /// Nombre de chunks retenus.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Concatène les chunks en un blob MP4 unique.
    #[must_use]
    pub fn finalize(self) -> Vec<u8> {
        self.chunks.concat()
    }
}

struct ActiveRecording {
    child: Child,
    reader: JoinHandle<RecordingSession>,
    frame_bytes: usize,
}

/// Encode des frames RGBA en MP4 fragmenté, accumulé en mémoire.
///
/// ffmpeg écrit sur stdout (`-movflags frag_keyframe+empty_moov`, le
/// format supporte ainsi un flux non-seekable) ; un thread lecteur
/// collecte les fragments au fil de l'eau. Une seule session à la fois.
pub struct RecordingSink {
    active: Option<ActiveRecording>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    /// Sink sans session active.
    #[must_use]
    pub fn new() -> Self {
        Self { active: None }
    }

    /// `true` si une session est en cours.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Démarre une session d'enregistrement aux dimensions données.
    ///
    /// # Errors
    /// `EngineError::RecordingAlreadyActive` si une session tourne déjà,
    /// `EngineError::RecordingUnavailable` si ffmpeg ne démarre pas.
    pub fn start(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        if self.active.is_some() {
            return Err(EngineError::RecordingAlreadyActive.into());
        }
        if width == 0 || height == 0 {
            return Err(EngineError::DegenerateDimensions { width, height }.into());
        }

        let mut child = Command::new("ffmpeg")
            .args([
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{width}x{height}"),
                "-r",
                &fps.to_string(),
                "-i",
                "-",
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                // yuv420p exige des dimensions paires
                "-vf",
                "scale=trunc(iw/2)*2:trunc(ih/2)*2",
                "-movflags",
                "frag_keyframe+empty_moov",
                "-f",
                "mp4",
                "-hide_banner",
                "-loglevel",
                "error",
                "pipe:1",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::RecordingUnavailable(format!(
                    "impossible de démarrer ffmpeg (est-il dans PATH ?) : {e}"
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .context("stdout ffmpeg non capturé")?;
        let reader = std::thread::Builder::new()
            .name("gc-record".into())
            .spawn(move || collect_chunks(stdout))
            .context("échec du démarrage du thread lecteur")?;

        log::info!("enregistrement démarré : {width}×{height} @ {fps} fps");
        self.active = Some(ActiveRecording {
            child,
            reader,
            frame_bytes: (width as usize) * (height as usize) * 4,
        });
        Ok(())
    }

    /// Pousse une frame RGBA rasterisée dans l'encodeur.
    ///
    /// # Errors
    /// `EngineError::RecordingUnavailable` si aucune session n'est
    /// active, erreur I/O si le pipe ffmpeg est fermé.
    pub fn write_frame(&mut self, fb: &PixelBuffer) -> Result<()> {
        let rec = self.active.as_mut().ok_or_else(|| {
            EngineError::RecordingUnavailable("aucune session active".into())
        })?;
        if fb.data.len() != rec.frame_bytes {
            anyhow::bail!(
                "frame de {} bytes pour une session attendant {}",
                fb.data.len(),
                rec.frame_bytes
            );
        }
        if let Some(stdin) = rec.child.stdin.as_mut() {
            stdin
                .write_all(&fb.data)
                .context("écriture dans le pipe ffmpeg")?;
        }
        Ok(())
    }

    /// Arrête la session et retourne le blob MP4 complet.
    ///
    /// # Errors
    /// `EngineError::RecordingUnavailable` si aucune session n'est
    /// active, erreur si ffmpeg termine en échec.
    pub fn stop(&mut self) -> Result<Vec<u8>> {
        let mut rec = self.active.take().ok_or_else(|| {
            EngineError::RecordingUnavailable("aucune session à arrêter".into())
        })?;

        // Fermer stdin déclenche la finalisation du flux côté ffmpeg.
        drop(rec.child.stdin.take());

        let session = rec
            .reader
            .join()
            .map_err(|_| anyhow::anyhow!("le thread lecteur a paniqué"))?;

        let output = rec.child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg encoder error: {stderr}");
        }

        log::info!("enregistrement arrêté : {} chunks", session.chunk_count());
        Ok(session.finalize())
    }
}

/// Lit stdout ffmpeg jusqu'à EOF, un chunk par lecture réussie.
fn collect_chunks(mut stdout: ChildStdout) -> RecordingSession {
    let mut session = RecordingSession::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => session.push_chunk(buf[..n].to_vec()),
            Err(e) => {
                log::warn!("lecture du flux encodé interrompue : {e}");
                break;
            }
        }
    }
    session
}

/// Écrit un blob finalisé sur disque.
///
/// # Errors
/// Retourne une erreur I/O si l'écriture échoue.
pub fn save_blob(path: &std::path::Path, blob: &[u8]) -> Result<()> {
    std::fs::write(path, blob).with_context(|| format!("écriture de {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_discards_empty_chunks() {
        let mut session = RecordingSession::new();
        session.push_chunk(Vec::new());
        session.push_chunk(vec![0xAA; 8]);
        session.push_chunk(Vec::new());
        session.push_chunk(vec![0xBB; 4]);
        assert_eq!(session.chunk_count(), 2);

        let blob = session.finalize();
        assert_eq!(blob.len(), 12);
        assert_eq!(&blob[..8], &[0xAA; 8]);
        assert_eq!(&blob[8..], &[0xBB; 4]);
    }

    #[test]
    fn stop_without_start_is_unavailable() {
        let mut sink = RecordingSink::new();
        let err = sink.stop().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::RecordingUnavailable(_))
        ));
    }

    #[test]
    fn write_frame_without_session_is_unavailable() {
        let mut sink = RecordingSink::new();
        let fb = PixelBuffer::new(4, 4);
        let err = sink.write_frame(&fb).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::RecordingUnavailable(_))
        ));
    }

    #[test]
    fn second_start_is_rejected_while_active() {
        // start() may fail if ffmpeg is absent from the test machine.
        // Either outcome is valid — the double-start check only applies
        // when the first session actually launched.
        let mut sink = RecordingSink::new();
        if sink.start(64, 64, 30).is_ok() {
            let err = sink.start(64, 64, 30).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<EngineError>(),
                Some(EngineError::RecordingAlreadyActive)
            ));
            let _ = sink.stop();
        }
        assert!(!sink.is_active());
    }

    #[test]
    fn degenerate_dimensions_are_rejected_before_spawn() {
        let mut sink = RecordingSink::new();
        let err = sink.start(0, 64, 30).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::DegenerateDimensions { .. })
        ));
        assert!(!sink.is_active());
    }
}
