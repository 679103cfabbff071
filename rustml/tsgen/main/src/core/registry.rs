//! Name-to-constructor table for window generator strategies.

use crate::api::error::{TsgenError, TsgenResult};
use crate::api::source::BatchSource;
use crate::api::types::SeriesData;
use crate::core::chunked::{ChunkedSettings, ChunkedTimeseriesGenerator};
use crate::core::padding::pad_x_and_y;
use crate::core::step::{default_step, deserialize_step};
use crate::core::window::WindowGenerator;
use chrono::TimeDelta;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Type-specific generator options, i.e. a configuration object minus `"type"`.
pub type GeneratorOptions = Map<String, Value>;

pub type GeneratorCtor =
    Arc<dyn Fn(GeneratorArgs, GeneratorOptions) -> TsgenResult<Box<dyn BatchSource>> + Send + Sync>;

/// Name under which the chunk-aware strategy is registered.
pub const CHUNKED_GENERATOR: &str = "GordoTimeseriesGenerator";

/// Option keys owned by [`GeneratorArgs`]; they always override the config.
const SHARED_KEYS: [&str; 5] = ["data", "targets", "length", "batch_size", "lookahead"];

/// Arguments every strategy receives regardless of configuration.
#[derive(Debug, Clone)]
pub struct GeneratorArgs {
    pub data: SeriesData,
    pub targets: SeriesData,
    pub length: usize,
    pub batch_size: usize,
    pub lookahead: i64,
}

impl GeneratorArgs {
    pub fn new(
        data: SeriesData,
        targets: SeriesData,
        length: usize,
        batch_size: usize,
        lookahead: i64,
    ) -> Self {
        Self {
            data,
            targets,
            length,
            batch_size,
            lookahead,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DefaultOptions {
    shuffle: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ChunkedOptions {
    #[serde(deserialize_with = "deserialize_step")]
    step: TimeDelta,
    shuffle: bool,
}

impl Default for ChunkedOptions {
    fn default() -> Self {
        Self {
            step: default_step(),
            shuffle: false,
        }
    }
}

/// Deserialize strategy options, reporting unknown or malformed keys.
pub fn parse_options<T: DeserializeOwned>(options: GeneratorOptions) -> TsgenResult<T> {
    serde_json::from_value(Value::Object(options))
        .map_err(|e| TsgenError::InvalidConfig(format!("timeseries_generator: {}", e)))
}

/// Plain sliding windows over the whole input, after lookahead alignment.
pub fn default_generator(
    args: GeneratorArgs,
    options: GeneratorOptions,
) -> TsgenResult<Box<dyn BatchSource>> {
    let options: DefaultOptions = parse_options(options)?;
    if let (Some(data), Some(targets)) = (args.data.as_frame(), args.targets.as_frame()) {
        if data.index() != targets.index() {
            return Err(TsgenError::IndexMismatch);
        }
    }
    let (data, targets) = pad_x_and_y(
        args.data.into_values(),
        args.targets.into_values(),
        args.lookahead,
    )?;
    let generator = WindowGenerator::new(data, targets, args.length, args.batch_size, options.shuffle)?;
    Ok(Box::new(generator))
}

/// Windows per contiguous chunk of a time-indexed frame.
pub fn chunked_generator(
    args: GeneratorArgs,
    options: GeneratorOptions,
) -> TsgenResult<Box<dyn BatchSource>> {
    let options: ChunkedOptions = parse_options(options)?;
    let data = args.data.as_frame().ok_or(TsgenError::NotTabular("Data"))?;
    let targets = args.targets.as_frame().ok_or(TsgenError::NotTabular("Targets"))?;
    let generator = ChunkedTimeseriesGenerator::new(
        data,
        targets,
        ChunkedSettings {
            length: args.length,
            batch_size: args.batch_size,
            shuffle: options.shuffle,
            step: options.step,
            lookahead: args.lookahead,
        },
    )?;
    Ok(Box::new(generator))
}

/// Selects a generator strategy by name.
///
/// Built once and passed to whatever needs to construct generators; there
/// is no process-wide instance.
#[derive(Clone)]
pub struct GeneratorRegistry {
    default_type: GeneratorCtor,
    types: BTreeMap<String, GeneratorCtor>,
}

impl GeneratorRegistry {
    /// Empty registry whose unconfigured fallback is `default_type`.
    pub fn new<F>(default_type: F) -> Self
    where
        F: Fn(GeneratorArgs, GeneratorOptions) -> TsgenResult<Box<dyn BatchSource>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            default_type: Arc::new(default_type),
            types: BTreeMap::new(),
        }
    }

    /// Plain windowing as the fallback, chunk-aware windowing registered as
    /// [`CHUNKED_GENERATOR`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new(default_generator);
        registry
            .types
            .insert(CHUNKED_GENERATOR.to_string(), Arc::new(chunked_generator));
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F) -> TsgenResult<()>
    where
        F: Fn(GeneratorArgs, GeneratorOptions) -> TsgenResult<Box<dyn BatchSource>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(TsgenError::DuplicateName(name));
        }
        self.types.insert(name, Arc::new(ctor));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Build the generator described by `config`, or the default one when
    /// there is no config.
    pub fn create_from_config(
        &self,
        config: Option<&GeneratorOptions>,
        args: GeneratorArgs,
    ) -> TsgenResult<Box<dyn BatchSource>> {
        let Some(config) = config else {
            return (self.default_type)(args, GeneratorOptions::new());
        };

        let type_name = match config.get("type") {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(TsgenError::InvalidConfig(format!(
                    "\"type\" of \"timeseries_generator\" must be a string, got {}",
                    other
                )))
            }
            None => return Err(TsgenError::MissingType),
        };
        let ctor = self
            .types
            .get(type_name)
            .ok_or_else(|| TsgenError::UnknownType(type_name.clone()))?;

        let mut options = config.clone();
        options.remove("type");
        for key in SHARED_KEYS {
            if options.remove(key).is_some() {
                log::debug!("timeseries_generator option '{}' overridden by caller", key);
            }
        }
        ctor(args, options)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}
