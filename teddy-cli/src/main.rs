use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{bail, Context, Error};
use serde_json::{Map, Value};
use teddy::Environment;

use crate::config::Config;
use crate::output::{Output, STDIN_STDOUT};

mod cli;
mod config;
mod output;

fn detect_format(path: &Path) -> Result<&'static str, Error> {
    Ok(match path.extension().and_then(|x| x.to_str()) {
        Some("json") => "json",
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => "yaml",
        #[cfg(feature = "toml")]
        Some("toml") => "toml",
        _ => bail!("cannot auto detect format from extension"),
    })
}

fn load_data(format: &str, path: &Path) -> Result<(Map<String, Value>, bool), Error> {
    let (contents, stdin_used) = if path == Path::new(STDIN_STDOUT) {
        (
            io::read_to_string(io::stdin()).context("unable to read data from stdin")?,
            true,
        )
    } else {
        (
            fs::read_to_string(path)
                .with_context(|| format!("unable to read data file '{}'", path.display()))?,
            false,
        )
    };
    let format = if format == "auto" {
        if stdin_used {
            bail!("auto detection does not work with data from stdin");
        }
        detect_format(path)?
    } else {
        format
    };

    let data: Value = match format {
        "json" => serde_json::from_str(&contents)?,
        #[cfg(feature = "yaml")]
        "yaml" => serde_yaml::from_str(&contents)?,
        #[cfg(feature = "toml")]
        "toml" => toml::from_str(&contents)?,
        other => bail!("unsupported data format '{}'", other),
    };

    match data {
        Value::Object(map) => Ok((map, stdin_used)),
        Value::Null => Ok((Map::new(), stdin_used)),
        _ => bail!("failed to interpret input data as object"),
    }
}

/// The template source, a name for errors and the default include root.
struct TemplateInput {
    source: String,
    name: String,
    root: PathBuf,
}

fn load_template(
    template: Option<&String>,
    template_file: Option<&String>,
    stdin_used_for_data: bool,
) -> Result<TemplateInput, Error> {
    let cwd = env::current_dir()?;
    if let Some(source) = template {
        return Ok(TemplateInput {
            source: source.clone(),
            name: "<template>".into(),
            root: cwd,
        });
    }
    match template_file.map(|x| x.as_str()) {
        None | Some(STDIN_STDOUT) => {
            if stdin_used_for_data {
                bail!("cannot read template from stdin when data is from stdin");
            }
            Ok(TemplateInput {
                source: io::read_to_string(io::stdin())
                    .context("unable to read template from stdin")?,
                name: "<stdin>".into(),
                root: cwd,
            })
        }
        Some(rel_name) => {
            let path = cwd.join(rel_name);
            let source = fs::read_to_string(&path)
                .with_context(|| format!("unable to read template '{}'", rel_name))?;
            let root = path.parent().map_or(cwd.clone(), Path::to_path_buf);
            Ok(TemplateInput {
                source,
                name: rel_name.to_string(),
                root,
            })
        }
    }
}

fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(config.level_filter())
        .with_target(false)
        .without_time()
        .init();
}

fn print_config(config: &Config) -> Result<(), Error> {
    #[cfg(feature = "toml")]
    {
        print!("{}", toml::to_string_pretty(config)?);
    }
    #[cfg(not(feature = "toml"))]
    {
        println!("{}", serde_json::to_string_pretty(config)?);
    }
    Ok(())
}

fn execute() -> Result<i32, Error> {
    let matches = cli::make_command().get_matches();
    let config = Config::load(&matches)?;
    init_logging(&config);

    if matches.get_flag("print-config") {
        print_config(&config)?;
        return Ok(0);
    }

    let (mut ctx, stdin_used) = match matches.get_one::<PathBuf>("data") {
        Some(data) => load_data(config.format(), data)?,
        None => (Map::new(), false),
    };
    for (key, value) in config.defines() {
        ctx.insert(key.clone(), value.clone());
    }

    let input = load_template(
        matches.get_one::<String>("template"),
        matches.get_one::<String>("template_file"),
        stdin_used,
    )?;

    let mut env = Environment::new();
    config.apply_to_env(&mut env, &input.root);
    tracing::debug!(
        template = %input.name,
        root = %config.template_root().unwrap_or(&input.root).display(),
        "rendering"
    );

    let output_path = matches
        .get_one::<PathBuf>("output")
        .map_or(Path::new(STDIN_STDOUT), |x| x.as_path());
    let mut output = Output::new(output_path)?;
    let rendered = env
        .render_named_str(&input.name, &input.source, &ctx)
        .with_context(|| format!("failed to render '{}'", input.name))?;
    if config.newline() {
        writeln!(&mut output, "{rendered}")?;
    } else {
        write!(&mut output, "{rendered}")?;
    }
    output.commit()?;
    Ok(0)
}

pub fn print_error(err: &Error) {
    eprintln!("error: {err}");
    let mut source_opt = err.source();
    while let Some(source) = source_opt {
        eprintln!();
        eprintln!("caused by: {source}");
        if let Some(limit) = source
            .downcast_ref::<teddy::Error>()
            .and_then(|x| x.pass_limit())
        {
            eprintln!("hint: check for circular includes or raise --max-passes (currently {limit})");
        }
        source_opt = source.source();
    }
}

fn main() {
    match execute() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            print_error(&err);
            std::process::exit(1);
        }
    }
}
