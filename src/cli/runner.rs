//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::ApiClient;
use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use crate::request::Request;
use crate::response::CallResult;
use crate::types::{JsonObject, JsonValue};
use futures::TryStreamExt;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use url::Url;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = ApiClient::from_settings(&self.settings()?)?;

        match &self.cli.command {
            Commands::Call { method, params } => {
                self.call(&client, method, params.as_deref()).await
            }
            Commands::Batch { file } => self.batch(&client, file.as_deref()).await,
            Commands::List {
                method,
                params,
                strategy,
            } => {
                let request = Request::with_parameters(method, parse_params(params.as_deref())?);
                self.print_items(client.list(request, (*strategy).into()))
                    .await
            }
            Commands::Reference {
                method,
                updates,
                params,
            } => {
                let template = Request::with_parameters(method, parse_params(params.as_deref())?);
                info!("Gathering {} per reference in {}", method, updates.display());

                let input_error = Arc::new(Mutex::new(None));
                let updates = until_error(
                    json_lines::<_, JsonObject>(open(updates)?),
                    input_error.clone(),
                );
                self.print_items(client.reference_batched_no_count(template, updates))
                    .await?;
                take_error(&input_error)
            }
        }
    }

    /// Settings from `--config`, or from the environment, with `--webhook` on top
    fn settings(&self) -> Result<Settings> {
        let webhook = self.cli.webhook.as_deref().map(Url::parse).transpose()?;

        let mut settings = match (&self.cli.config, &webhook) {
            (Some(path), _) => Settings::from_yaml_file(path)?,
            (None, Some(webhook)) => Settings::new(webhook.clone()),
            (None, None) => Settings::from_env()?,
        };

        if let Some(webhook) = webhook {
            settings.webhook_url = webhook;
            settings.validate()?;
        }
        Ok(settings)
    }

    async fn call(&self, client: &ApiClient, method: &str, params: Option<&str>) -> Result<()> {
        let request = Request::with_parameters(method, parse_params(params)?);
        let result = client.call(&request).await?;
        self.output(&result);
        Ok(())
    }

    /// Requests are read as the batches go out, so the input may be larger
    /// than memory. A bad line ends the input; lines before it are still sent.
    async fn batch(&self, client: &ApiClient, file: Option<&Path>) -> Result<()> {
        let reader: Box<dyn BufRead + Send> = match file {
            Some(path) => Box::new(open(path)?),
            None => Box::new(BufReader::new(std::io::stdin())),
        };

        let input_error = Arc::new(Mutex::new(None));
        let requests = until_error(json_lines::<_, Request>(reader), input_error.clone());

        let mut results = client.batch(requests);
        let mut index = 0usize;
        while let Some(result) = results.try_next().await? {
            self.output(&call_result_json(index, result));
            index += 1;
        }
        take_error(&input_error)?;
        info!("Ran {} requests", index);
        Ok(())
    }

    async fn print_items(&self, mut items: crate::types::ItemStream) -> Result<()> {
        let mut count = 0usize;
        while let Some(item) = items.try_next().await? {
            self.output(&item);
            count += 1;
        }
        info!("Printed {} items", count);
        Ok(())
    }

    /// Output a value in the chosen format
    fn output(&self, value: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(value).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(BufReader::new(File::open(path)?))
}

/// Parse `--params`; absent means no parameters
pub(crate) fn parse_params(params: Option<&str>) -> Result<JsonObject> {
    let Some(text) = params else {
        return Ok(JsonObject::new());
    };
    match serde_json::from_str::<JsonValue>(text)? {
        JsonValue::Object(object) => Ok(object),
        other => Err(Error::invalid_request(format!(
            "parameters must be a JSON object, got {other}"
        ))),
    }
}

/// JSON values read one per non-blank line, on demand
pub(crate) struct JsonLines<R, T> {
    lines: Lines<R>,
    line: usize,
    value: PhantomData<fn() -> T>,
}

pub(crate) fn json_lines<R: BufRead, T: DeserializeOwned>(reader: R) -> JsonLines<R, T> {
    JsonLines {
        lines: reader.lines(),
        line: 0,
        value: PhantomData,
    }
}

impl<R: BufRead, T: DeserializeOwned> Iterator for JsonLines<R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(&line).with_context(|| format!("line {}", self.line)),
            );
        }
    }
}

/// Pass values through until the first error, which is parked in `error`
pub(crate) fn until_error<T>(
    values: impl Iterator<Item = Result<T>>,
    error: Arc<Mutex<Option<Error>>>,
) -> impl Iterator<Item = T> {
    values.map_while(move |value| match value {
        Ok(value) => Some(value),
        Err(e) => {
            if let Ok(mut slot) = error.lock() {
                *slot = Some(e);
            }
            None
        }
    })
}

/// Surface an error parked by [`until_error`]
pub(crate) fn take_error(error: &Mutex<Option<Error>>) -> Result<()> {
    match error.lock().ok().and_then(|mut slot| slot.take()) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// One output line per batch call, tagged with its submission index
pub(crate) fn call_result_json(index: usize, result: CallResult) -> JsonValue {
    match result {
        CallResult::Success(response) => json!({ "index": index, "result": response.result }),
        CallResult::Failure { error, .. } => json!({ "index": index, "error": error }),
        CallResult::Skipped { .. } => json!({ "index": index, "skipped": true }),
    }
}
