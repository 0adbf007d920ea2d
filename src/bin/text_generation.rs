//! 单次文本生成：发送一个提示并打印回复

use clap::Parser;
use nanogemini::{LLMClient, NanoError, cli};

const DEFAULT_PROMPT: &str = "Write a four-line poem about a curious puppy exploring a garden.";

#[derive(Parser)]
#[command(name = "text_generation")]
#[command(author, version, about = "Send one prompt to Gemini and print the reply", long_about = None)]
struct Cli {
    /// 要发送的提示
    #[arg(default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// 以流式方式输出回复
    #[arg(long)]
    stream: bool,

    #[command(flatten)]
    common: cli::CommonArgs,
}

async fn print_streamed(client: &LLMClient, prompt: &str) -> nanogemini::Result<()> {
    let stream = client.stream_generate(prompt).await?;
    stream.write_to(&mut std::io::stdout()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    cli::init_logging(args.common.verbose);

    let config = args.common.apply(cli::api_config_or_exit());
    let client = LLMClient::new(config);

    println!("\nSending prompt to Gemini...");

    let result = if args.stream {
        println!("\nGemini's Response:");
        print_streamed(&client, &args.prompt).await
    } else {
        client.generate(&args.prompt).await.map(|text| {
            println!("\nGemini's Response:");
            println!("{}", text);
        })
    };

    match result {
        Ok(()) => {}
        Err(NanoError::NoContent) => {
            if !args.stream {
                println!("\nGemini's Response:");
            }
            println!("Received an unexpected response format.");
        }
        Err(e) => println!("\nAn error occurred during generation: {}", e),
    }
}
