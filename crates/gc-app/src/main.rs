use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use gc_core::config::RenderConfig;
use gc_core::frame::{AsciiFrame, PixelBuffer};
use gc_core::traits::Source;
use gc_export::recorder::{RecordingSink, save_blob};
use gc_export::{Rasterizer, save_png};
use gc_runtime::fps::FpsCounter;
use gc_runtime::{LoopState, PendingTick, RenderLoop};
use gc_source::image::ImageSource;
use gc_source::video::{VideoCommand, spawn_video_thread};

pub mod cli;
pub mod term;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config + appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    if let Some(rows) = cli.rows {
        config.max_rows = rows;
    }
    if let Some(fps) = cli.fps {
        config.record_fps = fps;
    }
    if cli.no_color {
        config.color_enabled = false;
    }
    if let Some(ref font) = cli.font {
        config.font_path = Some(font.clone());
    }
    config.clamp_all();

    // 5. Dispatcher selon la source
    if let Some(ref path) = cli.image {
        run_image(path, cli.output.as_deref(), &config)
    } else if let Some(ref path) = cli.video {
        run_video(path, cli.output.clone(), &config)
    } else {
        anyhow::bail!("Aucune source spécifiée.")
    }
}

/// Resolve config from --config, falling back to defaults if absent.
fn resolve_config(cli: &cli::Cli) -> Result<RenderConfig> {
    if cli.config.exists() {
        gc_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(RenderConfig::default())
    }
}

/// Construit le rasterizer d'export si une police est configurée.
fn build_rasterizer(config: &RenderConfig) -> Result<Option<Rasterizer>> {
    let Some(ref path) = config.font_path else {
        return Ok(None);
    };
    let data = std::fs::read(path)
        .with_context(|| format!("Impossible de lire la police {}", path.display()))?;
    Ok(Some(Rasterizer::new(&data, config.font_px)?))
}

fn video_filename() -> String {
    format!(
        "ascii-video-{}.mp4",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    )
}

/// Mode image : conversion one-shot haute qualité, affichage statique.
///
/// Touches : `e` exporte un snapshot PNG, `q`/Esc quitte.
fn run_image(path: &Path, output: Option<&Path>, config: &RenderConfig) -> Result<()> {
    let mut source = ImageSource::new(path)?;
    let first = source.next_frame().context("Source image vide")?;

    let mut rl = RenderLoop::new(config);
    rl.load(&first)?;
    rl.convert_image(&first)?;

    let mut terminal = term::TermSurface::new(config.color_enabled)?;
    terminal.present(rl.current_frame().context("Aucune frame convertie")?)?;

    loop {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('e') => {
                if let Some(frame) = rl.current_frame() {
                    let target = output.map_or_else(|| PathBuf::from("ascii-image.png"), Path::to_path_buf);
                    if let Err(e) = export_snapshot(config, frame, &target) {
                        log::error!("Export PNG échoué : {e}");
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Rasterise la grille courante et l'écrit en PNG.
fn export_snapshot(config: &RenderConfig, frame: &AsciiFrame, target: &Path) -> Result<()> {
    let rasterizer = build_rasterizer(config)?.ok_or_else(|| {
        anyhow::anyhow!("aucune police configurée (record.font_path ou --font)")
    })?;
    let mut fb = PixelBuffer::new(0, 0);
    rasterizer.render(frame, &mut fb);
    save_png(&fb, target)
}

/// État interactif du mode vidéo.
struct Player {
    rl: RenderLoop,
    sched: PendingTick,
    cmd_tx: flume::Sender<VideoCommand>,
    sink: RecordingSink,
    rasterizer: Option<Rasterizer>,
    raster_fb: PixelBuffer,
    record_fps: u32,
    output: Option<PathBuf>,
    quitting: bool,
}

impl Player {
    /// Touches : espace play/pause, `r` rewind, `s` start/stop
    /// enregistrement, `q`/Esc quitte.
    fn handle_event(&mut self, ev: &Event, config: &RenderConfig) {
        let Event::Key(key) = ev else { return };
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quitting = true,
            KeyCode::Char(' ') => self.toggle_playback(),
            KeyCode::Char('r') => {
                let _ = self.cmd_tx.send(VideoCommand::Rewind);
            }
            KeyCode::Char('s') => self.toggle_recording(config),
            _ => {}
        }
    }

    fn toggle_playback(&mut self) {
        if self.rl.state() == LoopState::Playing {
            let _ = self.cmd_tx.send(VideoCommand::Pause);
            self.rl.pause(&mut self.sched);
        } else {
            let _ = self.cmd_tx.send(VideoCommand::Play);
            self.rl.play(&mut self.sched);
        }
    }

    fn toggle_recording(&mut self, config: &RenderConfig) {
        if self.sink.is_active() {
            self.finish_recording();
            return;
        }

        if self.rasterizer.is_none() {
            self.rasterizer = match build_rasterizer(config) {
                Ok(r) => r,
                Err(e) => {
                    log::error!("Rasterizer indisponible : {e}");
                    None
                }
            };
        }
        let Some(rasterizer) = self.rasterizer.as_ref() else {
            log::warn!(
                "Enregistrement indisponible : aucune police configurée (record.font_path ou --font)"
            );
            return;
        };
        let Some(dims) = self.rl.dims() else {
            return;
        };

        let (width, height) = rasterizer.target_dimensions(dims.cols, dims.rows);
        if let Err(e) = self.sink.start(width, height, self.record_fps) {
            log::error!("Démarrage de l'enregistrement échoué : {e}");
        }
    }

    fn finish_recording(&mut self) {
        match self.sink.stop() {
            Ok(blob) => {
                let target = self
                    .output
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(video_filename()));
                match save_blob(&target, &blob) {
                    Ok(()) => log::info!("Enregistrement écrit : {}", target.display()),
                    Err(e) => log::error!("Écriture de l'enregistrement échouée : {e}"),
                }
            }
            Err(e) => log::error!("Arrêt de l'enregistrement échoué : {e}"),
        }
    }

    /// Un pas de la boucle : tick du loop, présentation, encodage.
    fn advance(
        &mut self,
        terminal: &mut term::TermSurface,
        latest: Option<&PixelBuffer>,
    ) -> Result<()> {
        let Some(generation) = self.sched.take() else {
            return Ok(());
        };
        let Some(frame) = self.rl.tick(generation, latest, &mut self.sched) else {
            return Ok(());
        };
        terminal.present(frame)?;

        if self.sink.is_active()
            && let Some(rasterizer) = self.rasterizer.as_ref()
        {
            rasterizer.render(frame, &mut self.raster_fb);
            if let Err(e) = self.sink.write_frame(&self.raster_fb) {
                log::warn!("Enregistrement interrompu : {e}");
                let _ = self.sink.stop();
            }
        }
        Ok(())
    }
}

/// Mode vidéo : lecture interactive au fps natif de la source.
fn run_video(path: &Path, output: Option<PathBuf>, config: &RenderConfig) -> Result<()> {
    let (frame_tx, frame_rx) = flume::bounded::<Arc<PixelBuffer>>(3);
    let (cmd_tx, cmd_rx) = flume::unbounded::<VideoCommand>();
    let (handle, info) = spawn_video_thread(path.to_path_buf(), frame_tx, cmd_rx)?;

    let mut player = Player {
        rl: RenderLoop::new(config),
        sched: PendingTick::new(),
        cmd_tx,
        sink: RecordingSink::new(),
        rasterizer: None,
        raster_fb: PixelBuffer::new(0, 0),
        record_fps: config.record_fps,
        output,
        quitting: false,
    };

    // ffmpeg peut mettre plusieurs secondes à produire la première frame.
    let first = frame_rx
        .recv_timeout(Duration::from_secs(10))
        .context("Aucune frame reçue du décodeur")?;
    player.rl.load(&first)?;
    player.rl.play(&mut player.sched);

    let mut terminal = term::TermSurface::new(config.color_enabled)?;
    terminal.present(player.rl.current_frame().context("Aucune frame convertie")?)?;

    let frame_budget = Duration::from_secs_f64(1.0 / info.fps.clamp(1.0, 120.0));
    let mut last_frame = Instant::now();
    let mut fps_counter = FpsCounter::new();

    while !player.quitting {
        let elapsed = last_frame.elapsed();
        if elapsed < frame_budget {
            // Dormir le temps restant, mais rester réactif aux événements.
            let remaining = frame_budget.saturating_sub(elapsed);
            if event::poll(remaining)? {
                player.handle_event(&event::read()?, config);
            }
            continue;
        }
        last_frame = Instant::now();

        while event::poll(Duration::ZERO)? {
            player.handle_event(&event::read()?, config);
        }

        // Drainer le canal : seule la frame la plus récente compte.
        let mut latest: Option<Arc<PixelBuffer>> = None;
        while let Ok(frame) = frame_rx.try_recv() {
            latest = Some(frame);
        }

        player.advance(&mut terminal, latest.as_deref())?;
        fps_counter.tick();
    }

    log::debug!("Boucle terminée @ {:.1} fps effectifs", fps_counter.fps());

    // Session encore active à la sortie : finaliser plutôt que perdre.
    if player.sink.is_active() {
        player.finish_recording();
    }

    // Restaurer le terminal AVANT de joindre le thread vidéo.
    drop(terminal);
    let _ = player.cmd_tx.send(VideoCommand::Quit);
    drop(frame_rx);
    let _ = handle.join();

    Ok(())
}
