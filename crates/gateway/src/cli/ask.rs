//! `codemitra ask | explain | generate`: one-shot questions.
//!
//! No history is kept between invocations. The answer goes to stdout so the
//! commands compose with pipes.

use std::io::Read;
use std::sync::Arc;

use cm_domain::config::Config;
use cm_providers::GenerateOptions;
use cm_sessions::PromptTemplate;

use crate::bootstrap;
use crate::runtime::error_reply;

use super::OneShotArgs;

/// Send `input` phrased through `template` and print the answer.
///
/// Model failures are printed like any other answer (tagged `[Error]`) and
/// the process exits with status 1.
pub async fn run(
    config: Arc<Config>,
    template: PromptTemplate,
    input: &str,
    args: OneShotArgs,
) -> anyhow::Result<()> {
    let input = input.trim();
    if input.is_empty() {
        anyhow::bail!("nothing to send: input is empty");
    }

    let state = bootstrap::build_app_state(config)?;
    let opts = GenerateOptions::with_model(args.model);

    let (answer, failed) = match state.orchestrator.ask(&template.apply(input), &opts).await {
        Ok(text) => (text, false),
        Err(e) => (error_reply(&e), true),
    };

    if args.json {
        let json = serde_json::to_string_pretty(&serde_json::json!({ "answer": answer }))
            .map_err(|e| anyhow::anyhow!("serializing answer: {e}"))?;
        println!("{json}");
    } else if failed {
        eprintln!("{answer}");
    } else {
        println!("{answer}");
    }

    if failed {
        std::process::exit(1);
    }

    Ok(())
}

/// Read the code to explain from `path`, or from stdin when `path` is `-`.
pub fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| anyhow::anyhow!("reading stdin: {e}"))?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))
}
