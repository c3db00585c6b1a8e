#[cfg(not(test))]
use clap::{Parser, Subcommand};
#[cfg(not(test))]
use std::fmt::Write as _;
#[cfg(not(test))]
use std::path::PathBuf;

#[cfg(not(test))]
use kreat::error::{KreatError, Result};
#[cfg(not(test))]
use kreat::factory::KreatFactory;
#[cfg(not(test))]
use kreat::menu::{self, ActionInputs, InputKind, Page};
#[cfg(not(test))]
use kreat::secrets::{self, SecretStore};
#[cfg(not(test))]
use kreat::session::Session;

#[cfg(not(test))]
#[derive(Parser, Debug)]
#[command(name = "kreat")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("KREAT_GIT_SHA"), ")"))]
#[command(about = "Shape a problem statement with Kreat's innovation prompts")]
struct Cli {
    /// Config file (defaults to config.json in the data directory).
    #[arg(long, global = true, env = "KREAT_CONFIG")]
    config: Option<String>,

    /// Data directory for config and stored secrets.
    #[arg(long, global = true, env = "KREAT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[cfg(not(test))]
#[derive(Subcommand, Debug)]
enum Command {
    /// List pages, actions and the inputs each action takes.
    Menu {
        #[arg(long)]
        page: Option<String>,
    },
    /// Run one action and print its output.
    Run {
        /// Action label, e.g. "Generate Title".
        action: String,

        #[arg(long)]
        page: Option<String>,

        /// Action input as name=value; repeatable.
        #[arg(short = 'i', long = "input", value_name = "NAME=VALUE")]
        inputs: Vec<String>,

        /// Session file read before and written after the action.
        #[arg(long)]
        session: Option<PathBuf>,
    },
    /// Manage secrets in the file-backed store.
    Secret {
        #[command(subcommand)]
        command: SecretCommand,
    },
}

#[cfg(not(test))]
#[derive(Subcommand, Debug)]
enum SecretCommand {
    Set { name: String, value: String },
    Delete { name: String },
}

#[cfg(not(test))]
const KNOWN_SECRETS: [&str; 5] = [
    secrets::AZURE_OPENAI_API_KEY,
    secrets::AZURE_OPENAI_API_VERSION,
    secrets::AZURE_OPENAI_CHAT_DEPLOYMENT_NAME,
    secrets::AZURE_OPENAI_ENDPOINT,
    secrets::EXA_API_KEY,
];

#[cfg(not(test))]
#[tokio::main]
async fn main() {
    kreat::logging::init_tracing("kreat");
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        if err.is_retryable() {
            eprintln!("the service did not respond successfully; try the action again shortly");
        }
        std::process::exit(match err {
            KreatError::Input(_) => 2,
            _ => 1,
        });
    }
}

#[cfg(not(test))]
async fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = cli.data_dir {
        kreat::runtime_paths::set_app_root_override(Some(dir));
    }
    let config_path = cli
        .config
        .unwrap_or_else(kreat::runtime_paths::default_config_path);

    match cli.command {
        Command::Menu { page } => {
            let pages = match page {
                Some(raw) => vec![Page::parse(&raw)?],
                None => Page::ALL.to_vec(),
            };
            print!("{}", menu_listing(&pages));
            Ok(())
        }
        Command::Run {
            action,
            page,
            inputs,
            session,
        } => {
            let page = page.as_deref().map(Page::parse).transpose()?;
            let action = menu::find(page, &action)?;
            let inputs = ActionInputs::from_pairs(&inputs)?;

            let mut state = match &session {
                Some(path) => Session::load(path)?,
                None => Session::default(),
            };
            let service = KreatFactory::create_from_path(&config_path, &SecretStore::new())?;
            let output = service.run(action, &inputs, &mut state).await?;
            print!("{}", output.render());

            if let Some(path) = &session {
                state.save(path)?;
            }
            Ok(())
        }
        Command::Secret { command } => {
            let store = SecretStore::new();
            match command {
                SecretCommand::Set { name, value } => {
                    check_secret_name(&name)?;
                    store.set(&name, &value)?;
                    println!("stored {name}");
                }
                SecretCommand::Delete { name } => {
                    check_secret_name(&name)?;
                    store.delete(&name)?;
                    println!("deleted {name}");
                }
            }
            Ok(())
        }
    }
}

#[cfg(not(test))]
fn check_secret_name(name: &str) -> Result<()> {
    if KNOWN_SECRETS.contains(&name) {
        Ok(())
    } else {
        Err(KreatError::Input(format!(
            "unknown secret {name}; expected one of {}",
            KNOWN_SECRETS.join(", ")
        )))
    }
}

#[cfg(not(test))]
fn menu_listing(pages: &[Page]) -> String {
    let mut out = String::new();
    for page in pages {
        let _ = writeln!(out, "{page}");
        for action in page.actions() {
            let _ = writeln!(out, "  {}", action.label());
            for field in action.inputs() {
                let detail = match field.kind {
                    InputKind::Slider { min, max, default } => {
                        format!("slider {min}-{max}, default {default}")
                    }
                    InputKind::Path => "path".to_string(),
                    InputKind::Text if field.required => "required".to_string(),
                    InputKind::Text => "optional".to_string(),
                };
                let (name, label) = (field.name, field.label);
                let _ = writeln!(out, "    -i {name}=...  {label} ({detail})");
            }
        }
    }
    out
}

#[cfg(test)]
fn main() {}
