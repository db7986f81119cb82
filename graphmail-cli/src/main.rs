//! graphmail CLI - read Graph mail resources in the terminal.

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use env_logger::fmt::WriteStyle;
use graphmail_core::html;
use graphmail_core::message::BodyContentType;
use graphmail_core::{
    AppConfig, AppPaths, EmailContent, FolderCollection, Message, MessageCollection, Renderer,
};
use log::{LevelFilter, debug, info};
use serde::Serialize;
use serde_json::json;

const APP_NAME: &str = env!("CARGO_PKG_NAME");

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("config loaded from {}", ctx.paths.global_config.display());

    match cli.command {
        Command::Convert(args) => handle_convert(&ctx, args),
        Command::Attachments(args) => handle_attachments(&ctx, args),
        Command::Show(args) => handle_show(&ctx, args),
        Command::List(args) => handle_list(&ctx, args),
        Command::Search(args) => handle_search(&ctx, args),
        Command::Folders(args) => handle_folders(&ctx, args),
        Command::Config { command } => handle_config(&ctx, command),
        Command::Init(cmd) => handle_init(&ctx, cmd),
        Command::Completions { shell } => handle_completions(shell),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Render Graph mail messages, listings and HTML bodies as terminal text.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(long, global = true)]
    debug: bool,
    #[arg(long, global = true)]
    trace: bool,
    #[arg(long, global = true, conflicts_with = "yaml")]
    json: bool,
    #[arg(long, global = true)]
    yaml: bool,
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    no_color: bool,
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    color: ColorOption,
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    #[arg(short = 'y', long = "yes", global = true)]
    assume_yes: bool,
    #[arg(long = "diagnostics", global = true)]
    diagnostics: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorOption {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert an HTML body to readable text
    Convert(ConvertArgs),
    /// List links in an HTML body that look like attachments
    #[command(alias = "att")]
    Attachments(InputArgs),
    /// Render a message resource (JSON)
    Show(ShowArgs),
    /// Render a folder listing (JSON collection)
    #[command(alias = "ls")]
    List(ListArgs),
    /// Render search results (JSON collection)
    Search(SearchArgs),
    /// Render the mailbox folders (JSON collection)
    Folders(InputArgs),
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    Init(InitCommand),
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Input file; reads stdin when omitted or "-"
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ContentTypeArg {
    #[default]
    Html,
    Text,
}

impl From<ContentTypeArg> for BodyContentType {
    fn from(value: ContentTypeArg) -> Self {
        match value {
            ContentTypeArg::Html => BodyContentType::Html,
            ContentTypeArg::Text => BodyContentType::Text,
        }
    }
}

#[derive(Debug, Args)]
struct ConvertArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Content type of the input; text passes through unchanged
    #[arg(short = 't', long = "content-type", value_enum, default_value_t = ContentTypeArg::Html)]
    content_type: ContentTypeArg,
}

#[derive(Debug, Args)]
struct ShowArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Print the body as delivered instead of converting HTML
    #[arg(long)]
    raw: bool,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Folder label for the header (default from config)
    #[arg(short = 'f', long)]
    folder: Option<String>,
    /// Maximum messages shown (default from config)
    #[arg(short = 'l', long)]
    limit: Option<usize>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Query the results were fetched for
    query: String,
    #[command(flatten)]
    input: InputArgs,
    #[arg(short = 'l', long)]
    limit: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Show,
    Path,
    Reset,
}

#[derive(Debug, Clone, Args)]
struct InitCommand {
    #[arg(long = "force")]
    force: bool,
}

#[derive(Debug, Clone)]
struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let paths = AppPaths::discover(common.config.clone()).map_err(|e| anyhow!("{e}"))?;
        AppConfig::ensure_default(&paths.global_config).map_err(|e| anyhow!("{e}"))?;
        let config = AppConfig::load(&paths).map_err(|e| anyhow!("{e}"))?;
        Ok(Self {
            common,
            paths,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

        builder.filter_level(self.effective_log_level());

        let force_color = matches!(self.common.color, ColorOption::Always)
            || env::var_os("FORCE_COLOR").is_some();
        let disable_color = self.common.no_color
            || matches!(self.common.color, ColorOption::Never)
            || env::var_os("NO_COLOR").is_some();

        if disable_color {
            builder.write_style(WriteStyle::Never);
        } else if force_color {
            builder.write_style(WriteStyle::Always);
        } else {
            builder.write_style(WriteStyle::Auto);
        }

        if self.common.diagnostics {
            builder.format_timestamp_millis();
            builder.format_module_path(true);
            builder.format_target(true);
        }

        builder.try_init().or_else(|err| {
            if self.common.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
            Ok(())
        })
    }

    fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => LevelFilter::Info,
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    fn renderer(&self) -> Result<Renderer> {
        let tz = self.config.timezone().map_err(|e| anyhow!("{e}"))?;
        Ok(Renderer::new(self.config.display.clone(), tz))
    }

    fn structured(&self) -> bool {
        self.common.json || self.common.yaml
    }
}

fn handle_convert(ctx: &RuntimeContext, args: ConvertArgs) -> Result<()> {
    let body = read_input(args.input.input.as_deref())?;
    let content_type = BodyContentType::from(args.content_type);
    let text = match content_type {
        BodyContentType::Html => html::convert(&body),
        BodyContentType::Text => body,
    };

    if ctx.structured() {
        return emit_output(
            &ctx.common,
            &json!({ "content_type": content_type, "text": text }),
        );
    }
    println!("{text}");
    Ok(())
}

fn handle_attachments(ctx: &RuntimeContext, args: InputArgs) -> Result<()> {
    let body = read_input(args.input.as_deref())?;
    let attachments = html::extract_attachments_info(&body);
    debug!("found {} attachment links", attachments.len());

    if ctx.structured() {
        return emit_output(&ctx.common, &attachments);
    }
    if attachments.is_empty() {
        info!("no attachment links found");
    }
    for attachment in &attachments {
        println!("{}\t{}", attachment.name, attachment.url);
    }
    Ok(())
}

fn handle_show(ctx: &RuntimeContext, args: ShowArgs) -> Result<()> {
    let payload = read_input(args.input.input.as_deref())?;
    let message = Message::from_json_str(&payload)
        .map_err(|e| anyhow!("{e}"))
        .context("parsing message resource")?;

    let mut email = EmailContent::from_message(&message);
    if args.raw {
        email.readable_content = message
            .body
            .as_ref()
            .and_then(|body| body.content.clone())
            .unwrap_or_default();
    }

    if ctx.structured() {
        return emit_output(&ctx.common, &email);
    }
    println!("{}", ctx.renderer()?.render_email(&email));
    Ok(())
}

fn handle_list(ctx: &RuntimeContext, args: ListArgs) -> Result<()> {
    let page = read_collection(args.input.input.as_deref())?;
    let limit = args.limit.unwrap_or(ctx.config.mail.list_limit);
    let messages = &page.value[..page.value.len().min(limit)];
    let folder = args
        .folder
        .unwrap_or_else(|| ctx.config.mail.default_folder.clone());

    if ctx.structured() {
        return emit_output(&ctx.common, messages);
    }
    println!("{}", ctx.renderer()?.render_message_list(messages, &folder));
    if page.next_link.is_some() {
        info!("more messages are available on the next page");
    }
    Ok(())
}

fn handle_search(ctx: &RuntimeContext, args: SearchArgs) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err(anyhow!("search query is required"));
    }
    let page = read_collection(args.input.input.as_deref())?;
    let limit = args.limit.unwrap_or(ctx.config.mail.list_limit);
    let messages = &page.value[..page.value.len().min(limit)];

    if ctx.structured() {
        return emit_output(&ctx.common, messages);
    }
    println!("{}", ctx.renderer()?.render_search_results(messages, query));
    Ok(())
}

fn handle_folders(ctx: &RuntimeContext, args: InputArgs) -> Result<()> {
    let payload = read_input(args.input.as_deref())?;
    let folders = FolderCollection::from_json_str(&payload)
        .map_err(|e| anyhow!("{e}"))
        .context("parsing folder collection")?;

    if ctx.structured() {
        return emit_output(&ctx.common, &folders.value);
    }
    println!("{}", ctx.renderer()?.render_folders(&folders.value));
    Ok(())
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => emit_output(&ctx.common, &ctx.config),
        ConfigCommand::Path => {
            println!("{}", ctx.paths.writable_config().display());
            Ok(())
        }
        ConfigCommand::Reset => {
            if ctx.common.dry_run {
                println!(
                    "dry-run: would reset config at {}",
                    ctx.paths.writable_config().display()
                );
                return Ok(());
            }
            AppConfig::write_default(ctx.paths.writable_config()).map_err(|e| anyhow!("{e}"))
        }
    }
}

fn handle_init(ctx: &RuntimeContext, cmd: InitCommand) -> Result<()> {
    let target = ctx.paths.writable_config();
    if target.exists() && !(cmd.force || ctx.common.assume_yes) {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            target.display()
        ));
    }
    if ctx.common.dry_run {
        println!("dry-run: would write default config to {}", target.display());
        return Ok(());
    }
    AppConfig::write_default(target).map_err(|e| anyhow!("{e}"))
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            fs::read_to_string(p).with_context(|| format!("reading input from {}", p.display()))
        }
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading input from stdin")?;
            Ok(buffer)
        }
    }
}

fn read_collection(path: Option<&Path>) -> Result<MessageCollection> {
    let payload = read_input(path)?;
    MessageCollection::from_json_str(&payload)
        .map_err(|e| anyhow!("{e}"))
        .context("parsing message collection")
}

fn emit_output<T: ?Sized + Serialize + std::fmt::Debug>(
    opts: &CommonOpts,
    value: &T,
) -> Result<()> {
    if opts.yaml {
        let yaml = serde_yaml::to_string(value)?;
        println!("{yaml}");
        return Ok(());
    }
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_args() {
        let cli = Cli::parse_from(["graphmail", "convert", "body.html", "-t", "text"]);
        match cli.command {
            Command::Convert(args) => {
                assert_eq!(args.input.input, Some(PathBuf::from("body.html")));
                assert!(matches!(args.content_type, ContentTypeArg::Text));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_alias_and_globals() {
        let cli = Cli::parse_from(["graphmail", "ls", "--limit", "5", "--json", "-vv"]);
        assert!(cli.common.json);
        assert_eq!(cli.common.verbose, 2);
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.limit, Some(5));
                assert!(args.input.input.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "<p>hello</p>").unwrap();
        let content = read_input(Some(file.path())).unwrap();
        assert_eq!(content, "<p>hello</p>");
    }

    #[test]
    fn test_read_collection_reports_bad_payload() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"id": "not a page"}}"#).unwrap();
        let err = read_collection(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("parsing message collection"));
    }

    #[test]
    fn test_content_type_arg_maps() {
        assert_eq!(
            BodyContentType::from(ContentTypeArg::Html),
            BodyContentType::Html
        );
        assert_eq!(
            BodyContentType::from(ContentTypeArg::Text),
            BodyContentType::Text
        );
    }
}
