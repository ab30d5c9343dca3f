mod charset;
mod report;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap::ValueEnum;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use tf_collapse::CollapseConfig;
use tf_collapse::button::find_button;
use tf_dom::Page;
use tf_html::HtmlParser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One line per comment with its toggle state
    Summary,
    /// The resulting document as HTML
    Html,
}

#[derive(Debug, Parser)]
#[command(name = "threadfold")]
#[command(about = "Add collapsible threads to a saved comment page")]
struct Cli {
    /// HTML file to process
    input: PathBuf,

    /// TOML file overriding the host-page contract
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Charset to decode the input with instead of sniffing <meta charset>
    #[arg(long)]
    encoding: Option<String>,

    /// HTML fragment appended to the comment container after the page loads
    #[arg(long)]
    append: Option<PathBuf>,

    /// Ids of comments whose toggle is clicked, in order
    #[arg(short, long = "toggle", value_name = "ID")]
    toggles: Vec<String>,

    #[arg(short, long, value_enum, default_value = "summary")]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => CollapseConfig::default(),
    };
    let output = run(&cli, config)?;
    print!("{output}");
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: &Path) -> Result<CollapseConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&source).with_context(|| format!("invalid config {}", path.display()))
}

fn parse_config(source: &str) -> Result<CollapseConfig> {
    let config: CollapseConfig = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli, config: CollapseConfig) -> Result<String> {
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let (html, encoding) = charset::decode_document(&bytes, cli.encoding.as_deref());
    tracing::info!(input = %cli.input.display(), encoding, bytes = bytes.len(), "loaded page");

    let fragment = match &cli.append {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read fragment {}", path.display()))?;
            Some(charset::decode_document(&bytes, cli.encoding.as_deref()).0)
        }
        None => None,
    };

    let mut page = HtmlParser.parse_page(&html)?;
    process(&mut page, config, fragment.as_deref(), &cli.toggles, cli.output)
}

/// Drives a freshly parsed page the way a browser would: install while
/// loading, finish parsing, then replay host insertions and user clicks.
fn process(
    page: &mut Page,
    config: CollapseConfig,
    fragment: Option<&str>,
    toggles: &[String],
    output: OutputFormat,
) -> Result<String> {
    let installation = tf_collapse::install(page, config)?;
    let config = installation.config;
    page.finish_parsing();

    if let Some(fragment) = fragment {
        let Some(container) = page.document().get_element_by_id(&config.container_id) else {
            bail!("page has no #{} to append to", config.container_id);
        };
        page.mutate(|doc| -> Result<()> {
            for node in HtmlParser.parse_fragment(doc, fragment)? {
                doc.append_child(container, node)?;
            }
            Ok(())
        })?;
        page.advance_time(config.debounce());
    }

    for id in toggles {
        let Some(comment) = page.document().get_element_by_id(id) else {
            bail!("no comment with id `{id}`");
        };
        let Some(button) = find_button(page.document(), &config, comment) else {
            bail!("comment `{id}` has no replies to fold");
        };
        page.click(button)?;
        page.advance_time(Duration::ZERO);
    }
    page.run_until_idle();

    Ok(match output {
        OutputFormat::Summary => {
            report::render_summary(&report::comment_rows(page.document(), &config))
        }
        OutputFormat::Html => tf_html::serialize(page.document(), tf_dom::Document::ROOT),
    })
}
