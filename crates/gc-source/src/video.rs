// Décodage vidéo via ffmpeg en subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`        : interroge ffprobe pour obtenir width/height/fps
//   - `spawn_ffmpeg_pipe`  : lance ffmpeg → flux raw RGBA sur stdout
//   - `spawn_video_thread` : thread dédié, lit les frames, gère les commandes
//   - `process_commands`   : dispatche les commandes dans la boucle principale
//   - `find_or_create_slot`: gère le pool Arc<PixelBuffer> zero-alloc

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use gc_core::frame::PixelBuffer;

/// Taille du pool de frames pré-allouées.
/// Doit être > capacité du canal (3) pour garantir un slot libre sans allocation.
const POOL_SIZE: usize = 6;

/// Commandes interactives pour le thread vidéo.
///
/// # Example
/// ```
/// use gc_source::video::VideoCommand;
/// let cmd = VideoCommand::Rewind;
/// assert!(matches!(cmd, VideoCommand::Rewind));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCommand {
    /// Reprendre la lecture.
    Play,
    /// Mettre en pause (le décodage s'arrête, la dernière frame reste).
    Pause,
    /// Revenir au début de la source (redémarre ffmpeg à t=0).
    Rewind,
    /// Arrêter le thread proprement.
    Quit,
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// État mutable centralisé du thread vidéo.
struct VideoState {
    w: u32,
    h: u32,
    /// True si la lecture est en pause.
    is_paused: bool,
    /// True après EOF, tant qu'aucun Rewind n'est reçu.
    at_eof: bool,
    /// Pool pré-alloué de frames réutilisables (zero-alloc en hot path).
    pool: Vec<Arc<PixelBuffer>>,
}

impl VideoState {
    fn new(info: &VideoInfo) -> Self {
        let pool = (0..POOL_SIZE)
            .map(|_| Arc::new(PixelBuffer::new(info.width, info.height)))
            .collect();
        Self {
            w: info.width,
            h: info.height,
            is_paused: false,
            at_eof: false,
            pool,
        }
    }
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let text = String::from_utf8_lossy(&output.stdout);

    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 30.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let val = val.trim();
            let mut parts = val.splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 {
                fps = num / den;
            }
        }
    }

    if width == 0 || height == 0 {
        anyhow::bail!(
            "ffprobe n'a trouvé aucun flux vidéo dans {}",
            path.display()
        );
    }

    log::info!(
        "probe_video: {width}x{height} @ {fps:.3}fps — {}",
        path.display()
    );

    Ok(VideoInfo { width, height, fps })
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` bytes (RGBA row-major, sans padding).
/// `-an` supprime l'audio (hors scope du moteur).
///
/// Retourne `None` si le spawn échoue (log::warn émis).
#[must_use]
pub fn spawn_ffmpeg_pipe(path: &Path, target_fps: u32) -> Option<Child> {
    let Some(path_str) = path.to_str() else {
        log::warn!("spawn_ffmpeg_pipe: chemin non-UTF8");
        return None;
    };

    let fps_str = target_fps.to_string();

    match Command::new("ffmpeg")
        .args([
            "-i",
            path_str, // fichier source
            "-f",
            "rawvideo", // format raw
            "-pix_fmt",
            "rgba", // RGBA 4 bytes/pixel
            "-r",
            &fps_str, // fps output
            "-an",    // pas d'audio dans ce pipe
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1", // stdout
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => {
            log::debug!("ffmpeg spawné @ {target_fps}fps pour {}", path.display());
            Some(child)
        }
        Err(e) => {
            log::warn!("spawn_ffmpeg_pipe: impossible de lancer ffmpeg: {e}");
            None
        }
    }
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false), // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Retourne `true` si le thread doit quitter (Quit reçu ou canal déconnecté).
/// Redémarre ffmpeg à t=0 si Rewind est reçu.
fn process_commands(
    cmd_rx: &Receiver<VideoCommand>,
    state: &mut VideoState,
    maybe_child: &mut Option<Child>,
    path: &Path,
    target_fps: u32,
) -> bool {
    loop {
        match cmd_rx.try_recv() {
            Ok(VideoCommand::Quit) => {
                if let Some(c) = maybe_child.as_mut() {
                    let _ = c.kill();
                }
                log::info!("Thread vidéo: Quit reçu, arrêt propre.");
                return true;
            }
            Ok(VideoCommand::Pause) => {
                state.is_paused = true;
                log::debug!("Thread vidéo: Pause");
            }
            Ok(VideoCommand::Play) => {
                state.is_paused = false;
                log::debug!("Thread vidéo: Play");
            }
            Ok(VideoCommand::Rewind) => {
                if let Some(c) = maybe_child.as_mut() {
                    let _ = c.kill();
                }
                *maybe_child = spawn_ffmpeg_pipe(path, target_fps);
                state.at_eof = false;
                log::debug!("Thread vidéo: Rewind -> 0.0s");
            }
            Err(flume::TryRecvError::Empty) => return false,
            Err(flume::TryRecvError::Disconnected) => {
                if let Some(c) = maybe_child.as_mut() {
                    let _ = c.kill();
                }
                return true;
            }
        }
    }
}

/// Trouve ou crée un slot libre dans le pool.
///
/// Invariant : retourne un index `i` tel que `Arc::strong_count(&pool[i]) == 1`.
/// Si tous les slots sont pris, alloue un nouveau slot (cas exceptionnel).
fn find_or_create_slot(pool: &mut Vec<Arc<PixelBuffer>>, w: u32, h: u32) -> usize {
    let free_idx = pool.iter().position(|a| Arc::strong_count(a) == 1);
    if let Some(i) = free_idx {
        if pool[i].data.len() != (w * h * 4) as usize {
            pool[i] = Arc::new(PixelBuffer::new(w, h));
        }
        i
    } else {
        // Pool saturé : allouer plutôt que bloquer.
        pool.push(Arc::new(PixelBuffer::new(w, h)));
        pool.len() - 1
    }
}

/// Spawne le thread de décodage vidéo via `ffmpeg` subprocess.
///
/// Le thread lit les frames RGBA depuis stdout de ffmpeg et les envoie
/// via `frame_tx`, strictement dans l'ordre source. Les commandes
/// (Play/Pause/Rewind/Quit) sont reçues depuis `cmd_rx`.
///
/// Retourne le handle du thread + les métadonnées du flux.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier est invalide.
pub fn spawn_video_thread(
    path: PathBuf,
    frame_tx: Sender<Arc<PixelBuffer>>,
    cmd_rx: Receiver<VideoCommand>,
) -> Result<(thread::JoinHandle<()>, VideoInfo)> {
    let info = probe_video(&path)?;

    let handle = thread::Builder::new()
        .name("gc-video".to_string())
        .spawn(move || {
            video_loop(&path, &frame_tx, &cmd_rx, info);
        })
        .context("Impossible de spawner le thread vidéo")?;

    Ok((handle, info))
}

/// Boucle principale du thread vidéo.
fn video_loop(
    path: &Path,
    frame_tx: &Sender<Arc<PixelBuffer>>,
    cmd_rx: &Receiver<VideoCommand>,
    info: VideoInfo,
) {
    let mut state = VideoState::new(&info);
    let target_fps = info.fps.clamp(1.0, 120.0).round() as u32;
    let frame_period = Duration::from_secs_f64(1.0 / info.fps.clamp(1.0, 120.0));
    let mut maybe_child = spawn_ffmpeg_pipe(path, target_fps);
    let mut last_frame = Instant::now();

    loop {
        // === Commandes (non-bloquant) ===
        if process_commands(cmd_rx, &mut state, &mut maybe_child, path, target_fps) {
            return;
        }

        // === Pause ===
        if state.is_paused {
            thread::sleep(Duration::from_millis(10));
            continue;
        }

        // === Timing FPS natif de la source ===
        let elapsed = last_frame.elapsed();
        if let Some(remaining) = frame_period.checked_sub(elapsed) {
            thread::sleep(remaining);
            continue;
        }
        last_frame = Instant::now();

        // === Obtenir un slot libre dans le pool (zero-alloc si possible) ===
        let frame_bytes = (state.w * state.h * 4) as usize;
        let idx = find_or_create_slot(&mut state.pool, state.w, state.h);

        // Arc::get_mut réussit ssi strong_count == 1 (garanti par find_or_create_slot)
        let Some(pb) = Arc::get_mut(&mut state.pool[idx]) else {
            continue;
        };

        // === Lire une frame depuis le pipe ffmpeg ===
        let read_result = maybe_child
            .as_mut()
            .and_then(|c| c.stdout.as_mut())
            .map_or(Ok(false), |stdout| {
                read_exact_or_eof(stdout, &mut pb.data[..frame_bytes])
            });

        match read_result {
            Ok(true) => {
                // Frame lue : envoyer un clone (pool garde sa référence).
                if frame_tx.send(Arc::clone(&state.pool[idx])).is_err() {
                    if let Some(mut c) = maybe_child {
                        let _ = c.kill();
                    }
                    return;
                }
            }
            Ok(false) => {
                // EOF : la source a fini, la dernière frame reste affichée.
                // Le thread survit pour honorer un éventuel Rewind.
                if !state.at_eof {
                    state.at_eof = true;
                    log::info!("Thread vidéo: EOF, en attente de commandes.");
                }
                if let Some(mut c) = maybe_child.take() {
                    let _ = c.wait();
                }
                thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                log::warn!("Thread vidéo: erreur lecture pipe: {e}");
                if let Some(mut c) = maybe_child.take() {
                    let _ = c.kill();
                }
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_exact_or_eof_handles_short_input() {
        let mut data: &[u8] = &[1, 2, 3];
        let mut buf = [0u8; 5];
        assert!(!read_exact_or_eof(&mut data, &mut buf).unwrap());

        let mut data: &[u8] = &[1, 2, 3, 4, 5, 6];
        assert!(read_exact_or_eof(&mut data, &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn pool_slot_reuse_respects_refcounts() {
        let mut pool: Vec<Arc<PixelBuffer>> = (0..2).map(|_| Arc::new(PixelBuffer::new(2, 2))).collect();

        let idx = find_or_create_slot(&mut pool, 2, 2);
        let held = Arc::clone(&pool[idx]);

        // Le slot tenu ne doit pas être réutilisé.
        let idx2 = find_or_create_slot(&mut pool, 2, 2);
        assert_ne!(idx, idx2);

        // Pool saturé : un nouveau slot est alloué.
        let held2 = Arc::clone(&pool[idx2]);
        let idx3 = find_or_create_slot(&mut pool, 2, 2);
        assert_eq!(idx3, 2);
        assert_eq!(pool.len(), 3);

        drop(held);
        drop(held2);
    }

    #[test]
    fn probe_missing_file_fails_cleanly() {
        // ffprobe absent OU fichier inexistant : dans les deux cas une
        // erreur propre, jamais de panique.
        assert!(probe_video(Path::new("/nonexistent/clip.mp4")).is_err());
    }
}
