//! Subcommand entry points: merge flags with the config file, expand the
//! patterns and run the batch.

use tmxconv::{
    Alignment, CsvToTmxOptions, TmxToCsvOptions,
    options::DEFAULT_SOURCE_LANG,
    schema::{SchemaCache, SchemaLocation},
};
use tracing::info;

use crate::{
    batch::{self, BatchSummary, Conversion},
    cli::{Csv2TmxArgs, Tmx2CsvArgs, ValidateArgs},
    config::Config,
    path_glob::expand_input_globs,
};

/// Recorded as `creationtool` unless the config names another tool.
pub const CREATION_TOOL: &str = "tmxconv";

pub fn csv_options(args: &Csv2TmxArgs, config: &Config) -> Result<CsvToTmxOptions, String> {
    let source_lang = args
        .source_lang
        .clone()
        .or_else(|| config.source_lang.clone())
        .unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_string());
    let seg_type = match args.seg_type {
        Some(seg_type) => seg_type,
        None => config.seg_type()?.unwrap_or_default(),
    };
    let (tool, version) = match &config.creation_tool {
        Some(tool) => (
            tool.clone(),
            config.creation_tool_version.clone().unwrap_or_default(),
        ),
        None => (
            CREATION_TOOL.to_string(),
            config
                .creation_tool_version
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        ),
    };

    Ok(CsvToTmxOptions::new()
        .with_source_index(args.source)
        .with_source_lang(source_lang)
        .with_seg_type(seg_type)
        .with_creation_tool(tool, version))
}

pub fn tmx_options(args: &Tmx2CsvArgs, config: &Config) -> TmxToCsvOptions {
    let alignment = if args.positional {
        Alignment::Positional
    } else {
        config.alignment.unwrap_or_default()
    };
    TmxToCsvOptions::new().with_alignment(alignment)
}

pub fn schema_location(args: &ValidateArgs, config: &Config) -> SchemaLocation {
    args.schema
        .as_deref()
        .or(config.schema_url.as_deref())
        .map(SchemaLocation::parse)
        .unwrap_or_default()
}

fn jobs(flag: Option<usize>, config: &Config) -> usize {
    flag.or(config.jobs).unwrap_or(1).max(1)
}

pub fn run_csv2tmx(args: &Csv2TmxArgs, config: &Config) -> Result<BatchSummary, String> {
    let conversion = Conversion::CsvToTmx(csv_options(args, config)?);
    let inputs = expand_input_globs(&args.patterns);
    Ok(batch::run_conversions(
        &inputs,
        &conversion,
        args.force,
        jobs(args.jobs, config),
    ))
}

pub fn run_tmx2csv(args: &Tmx2CsvArgs, config: &Config) -> Result<BatchSummary, String> {
    let conversion = Conversion::TmxToCsv(tmx_options(args, config));
    let inputs = expand_input_globs(&args.patterns);
    Ok(batch::run_conversions(
        &inputs,
        &conversion,
        args.force,
        jobs(args.jobs, config),
    ))
}

pub fn run_validate(args: &ValidateArgs, config: &Config) -> Result<BatchSummary, String> {
    let location = schema_location(args, config);
    info!(schema = %location, "validating");
    let cache = SchemaCache::new(location);
    let inputs = expand_input_globs(&args.patterns);
    Ok(batch::run_validation(
        &inputs,
        &cache,
        jobs(args.jobs, config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmxconv::SegType;
    use tmxconv::schema::TMX14_DTD_URL;

    fn csv_args() -> Csv2TmxArgs {
        Csv2TmxArgs {
            force: false,
            source: None,
            source_lang: None,
            seg_type: None,
            jobs: None,
            patterns: vec!["*.csv".to_string()],
        }
    }

    #[test]
    fn test_csv_defaults() {
        let options = csv_options(&csv_args(), &Config::default()).unwrap();
        assert_eq!(options.source_lang, "en");
        assert_eq!(options.source_index, None);
        assert_eq!(options.seg_type, SegType::Sentence);
        assert_eq!(options.creation_tool, "tmxconv");
        assert_eq!(options.creation_tool_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            source_lang: Some("fr".to_string()),
            seg_type: Some("phrase".to_string()),
            creation_tool: Some("pipeline".to_string()),
            jobs: Some(8),
            ..Config::default()
        };
        let from_config = csv_options(&csv_args(), &config).unwrap();
        assert_eq!(from_config.source_lang, "fr");
        assert_eq!(from_config.seg_type, SegType::Phrase);
        assert_eq!(from_config.creation_tool, "pipeline");
        assert_eq!(from_config.creation_tool_version, "");

        let args = Csv2TmxArgs {
            source_lang: Some("de".to_string()),
            seg_type: Some(SegType::Sentence),
            ..csv_args()
        };
        let from_flags = csv_options(&args, &config).unwrap();
        assert_eq!(from_flags.source_lang, "de");
        assert_eq!(from_flags.seg_type, SegType::Sentence);

        assert_eq!(jobs(None, &config), 8);
        assert_eq!(jobs(Some(2), &config), 2);
        assert_eq!(jobs(None, &Config::default()), 1);
    }

    #[test]
    fn test_alignment_resolution() {
        let args = Tmx2CsvArgs {
            force: false,
            positional: false,
            jobs: None,
            patterns: vec![],
        };
        assert_eq!(
            tmx_options(&args, &Config::default()).alignment,
            Alignment::ByLanguage
        );
        let config = Config {
            alignment: Some(Alignment::Positional),
            ..Config::default()
        };
        assert_eq!(tmx_options(&args, &config).alignment, Alignment::Positional);
        let args = Tmx2CsvArgs {
            positional: true,
            ..args
        };
        assert_eq!(
            tmx_options(&args, &Config::default()).alignment,
            Alignment::Positional
        );
    }

    #[test]
    fn test_schema_location_resolution() {
        let mut args = ValidateArgs {
            schema: None,
            jobs: None,
            patterns: vec![],
        };
        assert_eq!(
            schema_location(&args, &Config::default()).to_string(),
            TMX14_DTD_URL
        );
        let config = Config {
            schema_url: Some("local.dtd".to_string()),
            ..Config::default()
        };
        assert_eq!(schema_location(&args, &config).to_string(), "local.dtd");
        args.schema = Some("https://example.com/tmx.dtd".to_string());
        assert!(matches!(
            schema_location(&args, &config),
            SchemaLocation::Remote(_)
        ));
    }
}
