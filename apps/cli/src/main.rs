use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use reportsheet_cmdline::{parse_script, SessionCommand};
use reportsheet_core::{record_label, Record, ReportSession, ReportedCompany, SessionError};
use reportsheet_render::{
    artifact_file_name, compose_report, default_font_candidates, encode_png, export_raster,
    preview, rasterize, ComposeOptions, ExportFormat, FontResolver, PagePreset, ReportContent,
    DEFAULT_PREVIEW_FACTOR,
};
use reportsheet_settings::{PreferencesStore, ReportPreferences};
use serde::Deserialize;

#[derive(Parser)]
#[command(
    name = "reportsheet",
    about = "Render complaint/report sheets from records",
    author,
    version
)]
struct Cli {
    /// 偏好設定 JSON 檔路徑。 / Preferences JSON file (defaults are used when omitted).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// 提高日誌層級（可重複）。 / Raise log verbosity (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 由 JSON 輸入繪製報表頁面。 / Render a report page from a JSON input file.
    Render(RenderArgs),
    /// 輸出純文字摘要。 / Print the plain-text summary for a JSON input file.
    Summary(SummaryArgs),
    /// 逐行執行工作階段指令稿。 / Execute a session script line by line.
    Run(RunArgs),
    /// 檢視或修改偏好設定。 / Show or edit the preferences file given by `--config`.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// 輸出目前偏好設定。 / Print the effective preferences as JSON.
    Show,
    /// 修改並儲存偏好設定。 / Change preferences and save them.
    Set(ConfigSetArgs),
}

#[derive(Args)]
struct ConfigSetArgs {
    /// 頁面預設。 / Page preset (a4-300 or a4-150).
    #[arg(long, value_name = "PRESET", value_parser = parse_preset)]
    page: Option<PagePreset>,
    /// 每個工作階段的紀錄上限。 / Records accepted per session.
    #[arg(long, value_name = "N")]
    max_records: Option<usize>,
    /// 摘要換行寬度。 / Column at which long values wrap.
    #[arg(long, value_name = "COLUMNS")]
    wrap_width: Option<usize>,
    /// 頁面標題；空字串還原預設。 / Page heading; an empty value restores the default.
    #[arg(long, value_name = "TEXT")]
    title: Option<String>,
    #[arg(long, value_name = "BOOL")]
    card_background: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    reported_section: Option<bool>,
    /// 追加字型候選（可重複）。 / Append a font candidate (repeatable).
    #[arg(long = "font", value_name = "PATH")]
    fonts: Vec<PathBuf>,
    #[arg(long, value_name = "BOOL")]
    system_fonts: Option<bool>,
}

#[derive(Args)]
struct RenderArgs {
    /// 輸入的 JSON 檔案。 / Input JSON with `brand`, `records` and `reported`.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// 輸出格式。 / Output format.
    #[arg(long, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,
    /// 輸出目錄。 / Directory receiving the rendered files.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,
    /// 覆寫頁面預設（a4-300 / a4-150）。 / Override the page preset (a4-300 or a4-150).
    #[arg(long, value_name = "PRESET", value_parser = parse_preset)]
    page: Option<PagePreset>,
    /// 另存縮小預覽圖。 / Also write a downscaled preview PNG.
    #[arg(long)]
    preview: bool,
}

#[derive(Args)]
struct SummaryArgs {
    /// 輸入的 JSON 檔案。 / Input JSON with `brand`, `records` and `reported`.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
}

#[derive(Args)]
struct RunArgs {
    /// 指令稿路徑；`-` 代表標準輸入。 / Script file, or `-` for standard input.
    #[arg(long, value_name = "FILE")]
    script: PathBuf,
    /// render-png / render-pdf 的輸出目錄。 / Directory for render-png and render-pdf output.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,
    /// 覆寫頁面預設。 / Override the page preset.
    #[arg(long, value_name = "PRESET", value_parser = parse_preset)]
    page: Option<PagePreset>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Png,
    Pdf,
    Both,
}

impl FormatArg {
    fn formats(self) -> &'static [ExportFormat] {
        match self {
            FormatArg::Png => &[ExportFormat::Png],
            FormatArg::Pdf => &[ExportFormat::Pdf],
            FormatArg::Both => &[ExportFormat::Png, ExportFormat::Pdf],
        }
    }
}

/// JSON accepted by `render` and `summary`.
#[derive(Debug, Default, Deserialize)]
struct ReportInput {
    #[serde(default)]
    brand: String,
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    reported: Vec<ReportedCompany>,
}

/// Layout options and font chain derived from preferences.
struct Renderer {
    options: ComposeOptions,
    fonts: FontResolver,
}

fn parse_preset(value: &str) -> Result<PagePreset, String> {
    value.parse()
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        config,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);
    let config = config.as_deref();
    match command {
        Commands::Render(args) => execute_render(args, &load_preferences(config)?),
        Commands::Summary(args) => execute_summary(args, &load_preferences(config)?),
        Commands::Run(args) => execute_run(args, &load_preferences(config)?),
        Commands::Config(command) => execute_config(command, config),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_preferences(config: Option<&Path>) -> Result<ReportPreferences> {
    let Some(path) = config else {
        let mut preferences = ReportPreferences::default();
        preferences.sanitize();
        return Ok(preferences);
    };
    let store = PreferencesStore::load(path)
        .with_context(|| format!("failed to load preferences from {}", path.display()))?;
    Ok(store.preferences().clone())
}

fn execute_config(command: ConfigCommand, config: Option<&Path>) -> Result<()> {
    let Some(path) = config else {
        bail!("config commands need --config PATH");
    };
    let mut store = PreferencesStore::load(path)
        .with_context(|| format!("failed to load preferences from {}", path.display()))?;
    match command {
        ConfigCommand::Show => {}
        ConfigCommand::Set(args) => {
            store
                .update(|preferences| apply_config_changes(preferences, &args))
                .with_context(|| format!("failed to save preferences to {}", path.display()))?;
            println!("Saved preferences to {}", store.path().display());
        }
    }
    let json = serde_json::to_string_pretty(store.preferences())
        .context("failed to serialize preferences")?;
    println!("{json}");
    Ok(())
}

fn apply_config_changes(preferences: &mut ReportPreferences, args: &ConfigSetArgs) {
    if let Some(page) = args.page {
        preferences.layout.page = page.to_string();
    }
    if let Some(max_records) = args.max_records {
        preferences.session.max_records = max_records;
    }
    if let Some(wrap_width) = args.wrap_width {
        preferences.layout.wrap_width = wrap_width;
    }
    if let Some(title) = &args.title {
        preferences.layout.title = Some(title.clone());
    }
    if let Some(card_background) = args.card_background {
        preferences.layout.card_background = card_background;
    }
    if let Some(reported_section) = args.reported_section {
        preferences.layout.reported_section = reported_section;
    }
    preferences.fonts.candidates.extend(args.fonts.iter().cloned());
    if let Some(system_fonts) = args.system_fonts {
        preferences.fonts.use_system_fonts = system_fonts;
    }
}

impl Renderer {
    fn from_preferences(
        preferences: &ReportPreferences,
        page_override: Option<PagePreset>,
    ) -> Result<Self> {
        let preset = match page_override {
            Some(preset) => preset,
            None => preferences
                .layout
                .page
                .parse()
                .map_err(|err: String| anyhow!(err))?,
        };
        let mut options = ComposeOptions::for_preset(preset);
        options.wrap_width = preferences.layout.wrap_width;
        options.card_background = preferences.layout.card_background;
        options.reported_section = preferences.layout.reported_section;
        if let Some(title) = &preferences.layout.title {
            options.title = title.clone();
        }

        let mut candidates = preferences.fonts.candidates.clone();
        if preferences.fonts.use_system_fonts {
            candidates.extend(default_font_candidates());
        }
        Ok(Self {
            options,
            fonts: FontResolver::from_paths(candidates),
        })
    }

    /// Composes the session's page and writes one file per format.
    fn render(
        &self,
        session: &ReportSession,
        formats: &[ExportFormat],
        out_dir: &Path,
        with_preview: bool,
    ) -> Result<Vec<PathBuf>> {
        let generated_at = Local::now().naive_local();
        let content = ReportContent::from_session(session, generated_at);
        let page = compose_report(&content, &self.options, &self.fonts);
        let summary = page.summary;
        if summary.is_truncated() {
            eprintln!(
                "warning: {} of {} records did not fit on the page",
                summary.records_omitted(),
                summary.records_supplied
            );
        }

        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        let image = rasterize(&page);
        let mut written = Vec::with_capacity(formats.len() + 1);
        for &format in formats {
            let artifact = export_raster(&page, &image, format)
                .with_context(|| format!("failed to encode {format}"))?;
            let path = out_dir.join(&artifact.file_name);
            fs::write(&path, &artifact.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            written.push(path);
        }

        if with_preview {
            let small = preview(&image, DEFAULT_PREVIEW_FACTOR);
            let bytes = encode_png(&small).context("failed to encode preview")?;
            let name = artifact_file_name(
                &page.title,
                page.generated_at,
                ExportFormat::Png,
            );
            let stem = name.trim_end_matches(".png");
            let path = out_dir.join(format!("{stem}_preview.png"));
            fs::write(&path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            written.push(path);
        }
        Ok(written)
    }
}

fn read_input(path: &Path) -> Result<ReportInput> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Feeds the input through the same checks the form buttons apply.
fn session_from_input(input: ReportInput, preferences: &ReportPreferences) -> ReportSession {
    let mut session = ReportSession::with_capacity(preferences.session.max_records);
    session.set_brand(input.brand);
    for record in input.records {
        if let Err(err) = session.add_record(record) {
            eprintln!("warning: {err}");
            break;
        }
    }
    for entry in input.reported {
        if let Err(err) = session.add_reported(entry.company, entry.url) {
            eprintln!("warning: {err}");
        }
    }
    session
}

fn execute_render(args: RenderArgs, preferences: &ReportPreferences) -> Result<()> {
    let input = read_input(&args.input)?;
    let session = session_from_input(input, preferences);
    if let Err(err) = session.ensure_renderable() {
        eprintln!("warning: {err}");
        return Ok(());
    }
    let renderer = Renderer::from_preferences(preferences, args.page)?;
    for path in renderer.render(
        &session,
        args.format.formats(),
        &args.out_dir,
        args.preview,
    )? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn execute_summary(args: SummaryArgs, preferences: &ReportPreferences) -> Result<()> {
    let input = read_input(&args.input)?;
    let session = session_from_input(input, preferences);
    println!("{}", session.summary());
    Ok(())
}

fn execute_run(args: RunArgs, preferences: &ReportPreferences) -> Result<()> {
    let text = read_script(&args.script)?;
    let commands = parse_script(&text)?;
    let renderer = Renderer::from_preferences(preferences, args.page)?;
    let mut session = ReportSession::with_capacity(preferences.session.max_records);

    for (line, command) in commands {
        let keyword = command.keyword();
        match apply_command(&mut session, command, &renderer, &args.out_dir) {
            Ok(()) => {}
            Err(CommandFailure::Rejected(err)) => {
                eprintln!("warning: line {line}: {err}");
            }
            Err(CommandFailure::Fatal(err)) => {
                return Err(err.context(format!("line {line}: {keyword} failed")));
            }
        }
    }
    Ok(())
}

fn read_script(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read script from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Session rejections are reported and skipped; I/O and encoding errors stop the run.
enum CommandFailure {
    Rejected(SessionError),
    Fatal(anyhow::Error),
}

impl From<SessionError> for CommandFailure {
    fn from(err: SessionError) -> Self {
        CommandFailure::Rejected(err)
    }
}

impl From<anyhow::Error> for CommandFailure {
    fn from(err: anyhow::Error) -> Self {
        CommandFailure::Fatal(err)
    }
}

fn apply_command(
    session: &mut ReportSession,
    command: SessionCommand,
    renderer: &Renderer,
    out_dir: &Path,
) -> Result<(), CommandFailure> {
    match command {
        SessionCommand::AddRecord(record) => {
            let position = session.add_record(record)?;
            println!("Added record #{position}");
        }
        SessionCommand::PopRecord => {
            let record = session.pop_record()?;
            println!("Removed record [{}]", record_label(&record));
        }
        SessionCommand::ClearRecords => {
            session.clear_records();
            println!("Cleared records");
        }
        SessionCommand::AddReported { company, url } => {
            let position = session.add_reported(company, url)?;
            println!("Added reported company #{position}");
        }
        SessionCommand::RemoveReported { index } => {
            let removed = session.remove_reported(index.saturating_sub(1))?;
            println!("Removed reported company {}", removed.company);
        }
        SessionCommand::ClearReported => {
            session.clear_reported();
            println!("Cleared reported companies");
        }
        SessionCommand::SetBrand(brand) => {
            println!("Brand set to '{brand}'");
            session.set_brand(brand);
        }
        SessionCommand::SaveSnapshot { date } => {
            let now = Local::now().naive_local();
            let key = session.save_snapshot(date.unwrap_or_else(|| now.date()), now);
            println!("Saved snapshot {key}");
        }
        SessionCommand::LoadSnapshot(key) => {
            let loaded = session.load_snapshot_named(&key)?;
            println!(
                "Loaded snapshot {}: {} records, {} reported companies",
                loaded.key, loaded.records, loaded.reported
            );
        }
        SessionCommand::DeleteSnapshot(key) => {
            session.delete_snapshot_named(&key)?;
            println!("Deleted snapshot {}", key.trim());
        }
        SessionCommand::ClearSnapshots => {
            session.clear_snapshots();
            println!("Cleared snapshots");
        }
        SessionCommand::ListSnapshots => {
            let keys = session.snapshot_keys();
            if keys.is_empty() {
                println!("No snapshots");
            }
            for key in keys {
                println!("{key}");
            }
        }
        SessionCommand::Summary => println!("{}", session.summary()),
        SessionCommand::RenderPng => {
            render_command(session, renderer, ExportFormat::Png, out_dir)?;
        }
        SessionCommand::RenderPdf => {
            render_command(session, renderer, ExportFormat::Pdf, out_dir)?;
        }
    }
    Ok(())
}

fn render_command(
    session: &ReportSession,
    renderer: &Renderer,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<(), CommandFailure> {
    session.ensure_renderable()?;
    for path in renderer.render(session, &[format], out_dir, false)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
