//! Headless application run: open, apply ops, report, export

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use view_core::{AppConfig, Command, ThumbnailPump, ViewerSession};

#[derive(Parser, Debug)]
#[command(name = "imageview", about = "Image viewer with rotate, flip, filters and undo")]
#[command(version)]
pub struct Args {
    /// Image file or directory to open (defaults to the configured startup directory)
    pub path: Option<PathBuf>,

    /// Operations to apply in order, e.g. "rotate:90,flip-h,grayscale,undo"
    #[arg(long)]
    pub ops: Option<String>,

    /// Viewport size used for fit-to-window, as WxH
    #[arg(long, value_parser = parse_size)]
    pub fit: Option<(u32, u32)>,

    /// Save the displayed image; format follows the extension
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print file metadata
    #[arg(long)]
    pub info: bool,

    /// Generate thumbnails for the whole gallery
    #[arg(long)]
    pub thumbnails: bool,

    /// Write the effective configuration, to PATH or the default config file
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub save_config: Option<Option<PathBuf>>,
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width: {}", e))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height: {}", e))?;
    Ok((w, h))
}

pub fn run(args: &Args, config: AppConfig) -> Result<()> {
    if let Some(target) = &args.save_config {
        let target = target.clone().unwrap_or_else(AppConfig::config_path);
        config
            .save_to(&target)
            .with_context(|| format!("Failed to save config to {}", target.display()))?;
        println!("Config:      {}", target.display());
    }

    let path = args
        .path
        .clone()
        .unwrap_or_else(|| config.startup_directory());

    if path.is_file() && !view_fs::is_supported_image(&path) {
        bail!(
            "{} is not a supported image (expected one of: {})",
            path.display(),
            view_fs::SUPPORTED_EXTENSIONS.join(", ")
        );
    }

    let thumbnail_size = config.gallery.thumbnail_size;
    let thumbnail_threads = config.gallery.thumbnail_threads;

    let mut session = ViewerSession::new(config);
    if let Some((w, h)) = args.fit {
        session.set_viewport(w, h);
    }

    let opened = session
        .open(&path)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("Failed to open {}", path.display()))?;
    if !opened {
        println!("No images in {}", path.display());
        return Ok(());
    }

    if let Some(ops) = &args.ops {
        apply_ops(&mut session, ops)?;
    }

    print_status(&session);

    if args.info {
        print_metadata(&session)?;
    }

    if args.thumbnails {
        let mut pump = ThumbnailPump::new(thumbnail_size, thumbnail_threads)?;
        pump.request_all(session.gallery_mut());
        pump.wait_into(session.gallery_mut());
        for entry in session.gallery().entries() {
            match &entry.thumbnail {
                Some(thumb) => println!("  {:<40} {}x{}", entry.name, thumb.width(), thumb.height()),
                None => println!("  {:<40} (failed)", entry.name),
            }
        }
    }

    if let Some(out) = &args.out {
        export(&session, out)?;
    }

    Ok(())
}

fn apply_ops(session: &mut ViewerSession, ops: &str) -> Result<()> {
    let commands = Command::parse_list(ops)?;
    for cmd in &commands {
        let applied = session
            .dispatch(cmd)
            .with_context(|| format!("Command {} failed", cmd.id.as_str()))?;
        tracing::info!("{} -> {}", cmd.id.as_str(), if applied { "applied" } else { "no-op" });
    }
    Ok(())
}

fn print_status(session: &ViewerSession) {
    let Some(controller) = session.controller() else {
        return;
    };
    if let Some(file) = session.current_file() {
        println!("File:        {}", file.display());
    }
    if let Some(index) = session.gallery().current_index() {
        println!("Position:    {}/{}", index + 1, session.gallery().len());
    }
    if let Some(displayed) = controller.displayed_image() {
        println!("Displayed:   {}x{}", displayed.width(), displayed.height());
    }
    println!("Zoom:        {:.0}%", controller.zoom_factor() * 100.0);
    println!("Rotation:    {}°", controller.rotation_angle());
    println!("Theme:       {}", theme_name(session.config()));
    println!(
        "Flip:        {}{}",
        if controller.flipped_horizontal() { "H" } else { "-" },
        if controller.flipped_vertical() { "V" } else { "-" }
    );
    let history = session.history();
    println!(
        "History:     {}/{} (undo: {}, redo: {})",
        history.position(),
        history.len(),
        history.undo_text().unwrap_or("-"),
        history.redo_text().unwrap_or("-")
    );
}

fn theme_name(config: &AppConfig) -> &'static str {
    if config.general.dark_mode {
        "dark"
    } else {
        "light"
    }
}

fn print_metadata(session: &ViewerSession) -> Result<()> {
    let metadata = session.metadata()?;
    for (label, value) in metadata.rows() {
        println!("{:<13}{}", format!("{}:", label), value);
    }
    Ok(())
}

fn export(session: &ViewerSession, out: &Path) -> Result<()> {
    session
        .export_displayed(out)
        .with_context(|| format!("Failed to export to {}", out.display()))?;
    println!("Saved:       {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn args(path: &Path) -> Args {
        Args {
            path: Some(path.to_path_buf()),
            ops: None,
            fit: None,
            out: None,
            info: false,
            thumbnails: false,
            save_config: None,
        }
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("800x600"), Ok((800, 600)));
        assert_eq!(parse_size("10X20"), Ok((10, 20)));
        assert!(parse_size("800").is_err());
        assert!(parse_size("ax2").is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let args = Args::try_parse_from([
            "imageview", "photo.png", "--ops", "rotate:90,sepia", "--fit", "640x480", "--info",
        ])
        .unwrap();
        assert_eq!(args.path, Some(PathBuf::from("photo.png")));
        assert_eq!(args.fit, Some((640, 480)));
        assert!(args.info);
        assert!(!args.thumbnails);
    }

    #[test]
    fn test_run_exports_edited_image() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.png");
        RgbaImage::from_pixel(6, 2, Rgba([50, 100, 150, 255])).save(&input).unwrap();
        let output = temp_dir.path().join("out.png");

        let mut a = args(&input);
        a.ops = Some("rotate:90,negative".into());
        a.out = Some(output.clone());
        a.info = true;
        a.thumbnails = true;
        run(&a, AppConfig::default()).unwrap();

        let saved = image::open(&output).unwrap().to_rgba8();
        assert_eq!(saved.dimensions(), (2, 6));
        assert_eq!(saved.get_pixel(0, 0).0, [205, 155, 105, 255]);
    }

    #[test]
    fn test_save_config_flag() {
        let bare = Args::try_parse_from(["imageview", "--save-config"]).unwrap();
        assert_eq!(bare.save_config, Some(None));
        let with_path = Args::try_parse_from(["imageview", "--save-config", "cfg.toml", "a.png"]).unwrap();
        assert_eq!(with_path.save_config, Some(Some(PathBuf::from("cfg.toml"))));
        assert_eq!(with_path.path, Some(PathBuf::from("a.png")));
        assert_eq!(Args::try_parse_from(["imageview"]).unwrap().save_config, None);
    }

    #[test]
    fn test_run_saves_config() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.png");
        RgbaImage::new(2, 2).save(&input).unwrap();
        let config_file = temp_dir.path().join("conf").join("config.toml");

        let mut config = AppConfig::default();
        config.general.dark_mode = true;
        let mut a = args(&input);
        a.save_config = Some(Some(config_file.clone()));
        run(&a, config.clone()).unwrap();

        assert_eq!(AppConfig::load_from(&config_file).unwrap(), config);
    }

    #[test]
    fn test_theme_name() {
        let mut config = AppConfig::default();
        assert_eq!(theme_name(&config), "light");
        config.general.dark_mode = true;
        assert_eq!(theme_name(&config), "dark");
    }

    #[test]
    fn test_run_rejects_unsupported_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("notes.txt");
        std::fs::write(&input, "hello").unwrap();
        assert!(run(&args(&input), AppConfig::default()).is_err());
    }

    #[test]
    fn test_run_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(run(&args(temp_dir.path()), AppConfig::default()).is_ok());
    }
}
