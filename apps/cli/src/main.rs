use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use devtools_core::{
    AppStateContainer, CodeStyle, EditorFamily, JsonTabDocument, Route, TabDocument,
    XmlTabDocument,
};
use devtools_filesave::{FileFilter, FileSaver, FixedPathDialog};
use devtools_settings::{app_data_dir, StateStore, WindowSettingsStore};
use serde_json::Value as SerdeValue;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DEVTOOLS_LOG";

type App = AppStateContainer<StateStore>;

#[derive(Parser)]
#[command(
    name = "devtools-cli",
    about = "Inspect and drive the persisted state of the developer tools",
    author,
    version
)]
struct Cli {
    /// 指定資料夾；預設為平台設定目錄。 / Data directory (defaults to the platform configuration directory).
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 檢視或重設整個狀態樹。 / Show or reset the whole state tree.
    #[command(subcommand)]
    State(StateCommand),
    /// 管理編輯器分頁。 / Manage editor tabs.
    #[command(subcommand)]
    Tabs(TabsCommand),
    /// 解析導覽路徑並綁定分頁。 / Resolve a navigation path and bind its tab.
    Navigate(NavigateArgs),
    /// 調整側邊選單。 / Customize the sidebar menu.
    #[command(subcommand)]
    Menu(MenuCommand),
    /// 將分頁內容存成檔案。 / Save a tab's content to a file.
    Export(ExportArgs),
    /// 視窗幾何設定。 / Window geometry.
    #[command(subcommand)]
    Window(WindowCommand),
}

#[derive(Subcommand)]
enum StateCommand {
    /// Print the persisted state as JSON.
    Show,
    /// Print the location of the state file.
    Path,
    /// Discard all tool state.
    Reset,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FamilyChoice {
    Json,
    Xml,
}

impl From<FamilyChoice> for EditorFamily {
    fn from(choice: FamilyChoice) -> Self {
        match choice {
            FamilyChoice::Json => EditorFamily::Json,
            FamilyChoice::Xml => EditorFamily::Xml,
        }
    }
}

#[derive(Subcommand)]
enum TabsCommand {
    /// List open tabs; the active one is marked with `*`.
    List { family: FamilyChoice },
    /// Open a new tab and print its id.
    New { family: FamilyChoice },
    /// Replace a tab's code.
    Set(TabsSetArgs),
    /// 格式化分頁內容。 / Pretty-print a tab's code.
    Format(TabRef),
    /// 壓縮分頁內容。 / Strip insignificant whitespace from a tab's code.
    Compress(TabRef),
}

#[derive(Args)]
struct TabRef {
    family: FamilyChoice,
    id: String,
}

#[derive(Args)]
struct TabsSetArgs {
    family: FamilyChoice,
    id: String,
    /// 新的內容。 / New content.
    #[arg(long, conflicts_with = "code_file", required_unless_present = "code_file")]
    code: Option<String>,
    /// 從檔案讀取內容。 / Read the content from a file.
    #[arg(long, value_name = "FILE")]
    code_file: Option<PathBuf>,
}

#[derive(Args)]
struct NavigateArgs {
    path: String,
}

#[derive(Subcommand)]
enum MenuCommand {
    /// List menu items in display order.
    List {
        /// Include hidden items.
        #[arg(long)]
        all: bool,
    },
    Hide { id: String },
    Show { id: String },
    /// Give the listed items orders 0..n and re-sort.
    Reorder {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Restore the built-in menu.
    Reset,
}

#[derive(Args)]
struct ExportArgs {
    family: FamilyChoice,
    id: String,
    /// 輸出檔案路徑。 / Output file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum WindowCommand {
    /// Print the saved window geometry.
    Show,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let Cli { data_dir, command } = Cli::parse();
    let data_dir = resolve_data_dir(data_dir)?;
    match command {
        Commands::State(command) => execute_state_command(command, &data_dir),
        Commands::Tabs(command) => execute_tabs_command(command, &data_dir),
        Commands::Navigate(args) => execute_navigate(args, &data_dir),
        Commands::Menu(command) => execute_menu_command(command, &data_dir),
        Commands::Export(args) => execute_export(args, &data_dir),
        Commands::Window(WindowCommand::Show) => {
            let store = WindowSettingsStore::in_dir(&data_dir);
            let window = store.settings();
            let placement = if window.has_position() {
                format!("at ({}, {})", window.x, window.y)
            } else {
                "centered".to_string()
            };
            let maximised = if window.maximised { " maximised" } else { "" };
            println!("{}x{} {placement}{maximised}", window.width, window.height);
            Ok(())
        }
    }
}

fn open_app(data_dir: &Path) -> App {
    AppStateContainer::load(StateStore::in_dir(data_dir))
}

fn execute_state_command(command: StateCommand, data_dir: &Path) -> Result<()> {
    match command {
        StateCommand::Show => {
            let app = open_app(data_dir);
            let payload =
                serde_json::to_string_pretty(app.state()).context("failed to serialize state")?;
            println!("{payload}");
        }
        StateCommand::Path => {
            println!("{}", StateStore::in_dir(data_dir).path().display());
        }
        StateCommand::Reset => {
            let mut app = open_app(data_dir);
            app.reset();
            println!("Reset state in {}", app.persistence().path().display());
        }
    }
    Ok(())
}

fn execute_tabs_command(command: TabsCommand, data_dir: &Path) -> Result<()> {
    let mut app = open_app(data_dir);
    match command {
        TabsCommand::List { family } => match EditorFamily::from(family) {
            EditorFamily::Json => list_tabs::<JsonTabDocument>(&app),
            EditorFamily::Xml => list_tabs::<XmlTabDocument>(&app),
        },
        TabsCommand::New { family } => {
            let id = match EditorFamily::from(family) {
                EditorFamily::Json => app.create_tab::<JsonTabDocument>(),
                EditorFamily::Xml => app.create_tab::<XmlTabDocument>(),
            };
            println!("{id}");
        }
        TabsCommand::Set(args) => {
            let code = match (args.code, args.code_file) {
                (Some(code), _) => code,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => bail!("either --code or --code-file is required"),
            };
            let family = EditorFamily::from(args.family);
            let formatted = match family {
                EditorFamily::Json => app.set_tab_code::<JsonTabDocument>(&args.id, code),
                EditorFamily::Xml => app.set_tab_code::<XmlTabDocument>(&args.id, code),
            }
            .ok_or_else(|| anyhow!("{family} tab '{}' does not exist", args.id))?;
            let note = if formatted { " (formatted)" } else { "" };
            println!("Updated {family} tab {}{note}", args.id);
        }
        TabsCommand::Format(tab) => restyle(&mut app, tab, CodeStyle::Pretty)?,
        TabsCommand::Compress(tab) => restyle(&mut app, tab, CodeStyle::Compact)?,
    }
    Ok(())
}

fn restyle(app: &mut App, tab: TabRef, style: CodeStyle) -> Result<()> {
    let family = EditorFamily::from(tab.family);
    let outcome = match family {
        EditorFamily::Json => app.restyle_tab::<JsonTabDocument>(&tab.id, style),
        EditorFamily::Xml => app.restyle_tab::<XmlTabDocument>(&tab.id, style),
    }
    .ok_or_else(|| anyhow!("{family} tab '{}' does not exist", tab.id))?;
    outcome.with_context(|| format!("{family} tab '{}' left unchanged", tab.id))?;
    let verb = match style {
        CodeStyle::Pretty => "Formatted",
        CodeStyle::Compact => "Compressed",
    };
    println!("{verb} {family} tab {}", tab.id);
    Ok(())
}

fn list_tabs<D: TabDocument>(app: &App) {
    let active = app.current_tab(D::FAMILY);
    for summary in app.tabs::<D>().summaries() {
        let marker = if Some(&summary.id) == active { "*" } else { " " };
        println!("{marker} {}\t{}", summary.id, summary.title);
    }
}

fn execute_navigate(args: NavigateArgs, data_dir: &Path) -> Result<()> {
    let mut app = open_app(data_dir);
    let route = app.navigate(&args.path);
    if let Route::Editor { family, tab } = &route {
        tracing::debug!(%family, %tab, "bound editor tab");
    }
    println!("/{}", route.path());
    Ok(())
}

fn execute_menu_command(command: MenuCommand, data_dir: &Path) -> Result<()> {
    let mut app = open_app(data_dir);
    match command {
        MenuCommand::List { all } => {
            for item in app.menu().items() {
                if !all && !item.visible {
                    continue;
                }
                let hidden = if item.visible { "" } else { "\t(hidden)" };
                println!(
                    "{}\t{}\t{}\t{}{hidden}",
                    item.order,
                    item.id(),
                    item.path,
                    item.title
                );
            }
        }
        MenuCommand::Hide { id } => {
            app.set_menu_visibility(&id, false)?;
            println!("Hid {id}");
        }
        MenuCommand::Show { id } => {
            app.set_menu_visibility(&id, true)?;
            println!("Showing {id}");
        }
        MenuCommand::Reorder { ids } => {
            let updated = app.reorder_menu(&ids);
            if updated == 0 {
                bail!("none of the given ids are menu items");
            }
            println!("Reordered {updated} item(s)");
        }
        MenuCommand::Reset => {
            app.reset_menu();
            println!("Menu restored");
        }
    }
    Ok(())
}

fn execute_export(args: ExportArgs, data_dir: &Path) -> Result<()> {
    let app = open_app(data_dir);
    let family = EditorFamily::from(args.family);
    let code = match family {
        EditorFamily::Json => app.tab::<JsonTabDocument>(&args.id).map(|doc| doc.code()),
        EditorFamily::Xml => app.tab::<XmlTabDocument>(&args.id).map(|doc| doc.code()),
    }
    .ok_or_else(|| anyhow!("{family} tab '{}' does not exist", args.id))?;

    let output = resolve_path(&args.output)?;
    let filter = match family {
        EditorFamily::Json => FileFilter::json(),
        EditorFamily::Xml => FileFilter::xml(),
    };
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    if !filter.matches(&name) {
        tracing::warn!(
            file = %name,
            expected = %filter.display_name,
            "export file name does not match the editor family"
        );
    }
    let saver = FileSaver::new(FixedPathDialog::new(&output));
    let filename = family.default_filename();
    let saved = match family {
        EditorFamily::Json => match serde_json::from_str::<SerdeValue>(code) {
            Ok(value) => saver.save_json(&value, filename),
            Err(_) => saver.save_text(code, filename),
        },
        EditorFamily::Xml => saver.save_xml(code, filename),
    }
    .with_context(|| format!("failed to export {family} tab '{}'", args.id))?;
    println!("Saved {}", saved.display());
    Ok(())
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
    match data_dir {
        Some(path) => resolve_path(&path),
        None => app_data_dir().context("no application data directory on this platform; pass --data-dir"),
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path))
    }
}
