mod hook;
mod hook_config;
mod interrupt;
mod logging;
mod options;

use anyhow::Result;
use clap::{CommandFactory as _, Parser, Subcommand};
use options::Options;
use std::path::Path;
use std::process::exit;

fn main() {
    let args = Args::parse();
    handle_result(run_args(args));
}

fn run_args(args: Args) -> Result<()> {
    match &args.command {
        None if args.config => hook_config::print(&args.options),
        None => {
            logging::set_up(&logging::Options {
                debug: args.options.debug,
                log_file: args.options.log_file.clone(),
            })?;
            let interrupt_state = interrupt::set_up_process_interrupt_handler()?;
            let logs_to_stderr = args.options.log_file == Path::new("-");
            hook::run(&args.options, &interrupt_state).inspect_err(|e| {
                // handle_result reports on stderr
                if !logs_to_stderr {
                    tracing::error!("{:#}", e);
                }
            })
        }
        Some(Commands::GenerateMan) => {
            let cmd = Args::command();
            let man = clap_mangen::Man::new(cmd);
            let mut buffer: Vec<u8> = Default::default();
            man.render(&mut buffer)?;
            println!("{}", String::from_utf8(buffer)?);
            Ok(())
        }
        Some(Commands::GenerateMarkdown) => {
            let opts = clap_markdown::MarkdownOptions::new().show_footer(false);
            let markdown: String = clap_markdown::help_markdown_custom::<Args>(&opts);
            println!("{}", markdown);
            Ok(())
        }
        Some(Commands::GenerateCompletion { shell }) => {
            let mut cmd = Args::command();
            clap_complete::generate(*shell, &mut cmd, "envinjector", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn handle_result(r: Result<()>) {
    match r {
        Ok(()) => {}
        Err(e) => {
            eprintln!("envinjector error: {:#}", e);
            exit(1);
        }
    }
}

/// Inject required environment variables into the containers of watched
/// pods. Runs as a shell-operator hook.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print the hook configuration for shell-operator and exit
    #[arg(long)]
    config: bool,

    #[command(flatten)]
    options: Options,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate markdown documentation for envinjector
    #[command(hide = true)]
    GenerateMarkdown,

    /// Generate a manpage for envinjector
    #[command(hide = true)]
    GenerateMan,

    /// Generate shell completion for envinjector
    #[command(hide = true)]
    GenerateCompletion {
        /// The shell to generate completion for
        #[arg(long)]
        shell: clap_complete::Shell,
    },
}
