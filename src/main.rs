//! gamevault command line tool
//!
//! Inspects and prepares data files outside the game: derives keys,
//! encrypts or decrypts single files, and moves translation packs in and
//! out of the phrase tables.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use gamevault::crypt::{self, CryptKey};
use gamevault::localization::{Language, LanguageContent, LanguagePack};
use gamevault::{Catalog, Result, StoreConfig, StoreContext};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store config file (JSON). Overrides --root
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the persistent/streaming/project roots
    #[clap(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the key and IV derived from a passphrase
    DeriveKey { passphrase: String },

    /// Encrypt a file
    Encrypt {
        #[clap(short, long)]
        passphrase: String,
        input: PathBuf,
        /// Output file; prints to stdout when omitted
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Decrypt a file
    Decrypt {
        #[clap(short, long)]
        passphrase: String,
        input: PathBuf,
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the phrases a language is missing as a translation pack
    LangExport {
        #[clap(long, default_value = "en")]
        source: Language,
        #[clap(long)]
        target: Language,
        #[clap(long, value_enum, default_value_t = CatalogArg::Project)]
        catalog: CatalogArg,
        output: PathBuf,
    },

    /// Apply a translated pack to its language table
    LangImport {
        #[clap(long, value_enum, default_value_t = CatalogArg::Project)]
        catalog: CatalogArg,
        pack: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CatalogArg {
    Persistent,
    Streaming,
    Project,
}

impl From<CatalogArg> for Catalog {
    fn from(arg: CatalogArg) -> Self {
        match arg {
            CatalogArg::Persistent => Catalog::Persistent,
            CatalogArg::Streaming => Catalog::Streaming,
            CatalogArg::Project => Catalog::Project,
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn emit(text: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            gamevault::storage::atomic_write(&path, text.as_bytes())?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn store_config(args: &Args) -> Result<StoreConfig> {
    if let Some(path) = &args.config {
        return StoreConfig::from_file(path);
    }
    Ok(match &args.root {
        Some(root) => StoreConfig::rooted_at(root),
        None => StoreConfig::for_app("gamevault"),
    })
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ctx = StoreContext::new(store_config(&args)?);

    match args.command {
        Command::DeriveKey { passphrase } => {
            let key = CryptKey::get(&passphrase);
            println!("key: {}", hex(key.key()));
            println!("iv:  {}", hex(key.iv()));
        }
        Command::Encrypt {
            passphrase,
            input,
            output,
        } => {
            let text = fs::read_to_string(&input)?;
            emit(&crypt::encrypt(&text, &CryptKey::get(&passphrase)), output)?;
        }
        Command::Decrypt {
            passphrase,
            input,
            output,
        } => {
            let text = fs::read_to_string(&input)?;
            let plain = crypt::try_decrypt(text.trim(), &CryptKey::get(&passphrase))?;
            emit(&plain, output)?;
        }
        Command::LangExport {
            source,
            target,
            catalog,
            output,
        } => {
            let mut source = LanguageContent::new(ctx.clone(), source, catalog.into());
            let mut target = LanguageContent::new(ctx.clone(), target, catalog.into());
            let pack = LanguagePack::missing(&mut source, &mut target);
            pack.export(&output)?;
            println!("{} phrases to translate", pack.len());
        }
        Command::LangImport { catalog, pack } => {
            let pack = LanguagePack::import(&pack)?;
            let mut content = LanguageContent::new(ctx.clone(), pack.language, catalog.into());
            let applied = pack.apply_to(&mut content)?;
            content.apply()?;
            println!("{} phrases applied to '{}'", applied, pack.language);
        }
    }

    ctx.teardown();
    Ok(())
}
