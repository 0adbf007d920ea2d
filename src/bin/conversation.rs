//! 交互式对话：逐行读取输入，输入 quit 结束

use clap::Parser;
use nanogemini::{LLMClient, cli, conversation::run_conversation};

#[derive(Parser)]
#[command(name = "conversation")]
#[command(author, version, about = "Chat with Gemini from the terminal", long_about = None)]
struct Cli {
    #[command(flatten)]
    common: cli::CommonArgs,
}

#[tokio::main]
async fn main() -> nanogemini::Result<()> {
    let args = Cli::parse();
    cli::init_logging(args.common.verbose);

    let config = args.common.apply(cli::api_config_or_exit());
    let client = LLMClient::new(config);
    let mut chat = client.start_chat(Vec::new());

    let stdin = std::io::stdin();
    run_conversation(&mut chat, stdin.lock(), std::io::stdout()).await?;
    Ok(())
}
