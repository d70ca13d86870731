use std::path::PathBuf;

use clap::{arg, command, value_parser, ArgAction, Command};

const BEHAVIOR: &str = "Template Behavior";
const OUTPUT: &str = "Output";

/// Supported data formats with their file extensions.
pub static SUPPORTED_FORMATS: &[(&str, &str, &[&str])] = &[
    ("json", "JSON", &["json"]),
    #[cfg(feature = "toml")]
    ("toml", "TOML", &["toml"]),
    #[cfg(feature = "yaml")]
    ("yaml", "YAML", &["yaml", "yml"]),
];

fn format_formats(s: &str) -> String {
    use std::fmt::Write;
    let mut formats = String::new();

    for (fmt, title, exts) in SUPPORTED_FORMATS.iter() {
        write!(formats, "- {} ({}): ", fmt, title).ok();
        for (idx, ext) in exts.iter().enumerate() {
            if idx > 0 {
                formats.push_str(", ");
            }
            formats.push_str("*.");
            formats.push_str(ext);
        }
        formats.push('\n');
    }

    s.replace("###FORMATS###", &formats)
}

pub(super) fn make_command() -> Command {
    command!()
        .name("teddy")
        .max_term_width(120)
        .args([
            #[cfg(feature = "toml")]
            arg!(--"config-file" <PATH> "Alternative path to the config file")
                .value_parser(value_parser!(PathBuf))
                .long_help("\
                    Sets an alternative path to the config file.  By default the config file \
                    is loaded from $HOME/.teddy.toml if it exists.\n\n\
                    \
                    To see the possible config values use --print-config which will print the \
                    current state of the config.\n\n\
                    [env var: TEDDY_CONFIG_FILE]"),
            arg!(-f --format <FORMAT> "The format of the input data")
                .long_help(format_formats("\
                    Sets the format of the input data.\n\n\
                    \
                    The following formats are supported (and the default detected file extensions):\n\n\
                    - auto\n\
                    ###FORMATS###\n\
                    Auto detection (auto) is unavailable when stdin is used as input.\n\n\
                    [env var: TEDDY_FORMAT]"))
                .value_parser([
                    "auto",
                    "json",
                    #[cfg(feature = "toml")]
                    "toml",
                    #[cfg(feature = "yaml")]
                    "yaml",
                ]),
            arg!(-D --define <EXPR> "Defines a model variable (key=value / key:=json_value)")
                .long_help("\
                    Defines a model variable in addition to the data file.  key defines \
                    a true boolean, key=value a string and key:=json_value any JSON value.  \
                    Defines take precedence over values from the data file.\n\n\
                    \
                    Examples:\n\
                    -D name=Peter       defines a basic string\n\
                    -D count:=42        defines an integer\n\
                    -D admin            shortform to define true")
                .action(ArgAction::Append),
            arg!(-t --template <SOURCE> "Renders this string instead of a template file")
                .conflicts_with("template_file"),
            arg!(--"template-root" <PATH> "Directory that includes are loaded from")
                .long_help("\
                    Sets the directory that <include src=\"...\"> loads templates from.  A \
                    name is looked up as given and then with .html appended.  Defaults to \
                    the directory of the template file, or the working directory.\n\n\
                    [env var: TEDDY_TEMPLATE_ROOT]")
                .value_parser(value_parser!(PathBuf))
                .help_heading(BEHAVIOR),
            arg!(--"max-passes" <AMOUNT> "Maximum number of passes per render")
                .long_help("\
                    Sets the maximum number of passes a render may take.  Every include and \
                    every additional pass over the output consumes one.  Renders that need \
                    more fail, which is how circular includes are reported.\n\n\
                    [env var: TEDDY_MAX_PASSES]")
                .value_parser(value_parser!(u32).range(1..))
                .help_heading(BEHAVIOR),
            arg!(--"hide-undefined" "Render unresolved tokens as empty strings")
                .long_help("\
                    By default a {token} that is not in the model is kept in the output.  \
                    With this flag it is removed instead.\n\n\
                    [env var: TEDDY_HIDE_UNDEFINED]")
                .help_heading(BEHAVIOR),
            arg!(-o --output <FILENAME> "Path to the output file")
                .long_help("\
                    Writes the result to this file instead of stdout.  The file is replaced \
                    atomically once rendering succeeded.")
                .default_value("-")
                .value_parser(value_parser!(PathBuf))
                .help_heading(OUTPUT),
            arg!(-n --"no-newline" "Do not output a trailing newline")
                .long_help("\
                    Do not output a trailing newline after the rendered template.\n\n\
                    [env var: TEDDY_NEWLINE]")
                .help_heading(OUTPUT),
            arg!(-v --verbose... "Increase diagnostics, can be repeated")
                .long_help("\
                    Raises the verbosity of diagnostics printed to stderr.  Warnings (such \
                    as missing includes) are shown by default, -v adds notes about dropped \
                    malformed tags and -vv debug output.\n\n\
                    [env var: TEDDY_VERBOSITY]")
                .conflicts_with("quiet")
                .help_heading(OUTPUT),
            arg!(-q --quiet "Do not print any diagnostics").help_heading(OUTPUT),
            arg!(--"print-config" "Print out the loaded config"),
            arg!(template_file: [TEMPLATE] "Path to the template file (- for stdin)"),
            arg!(data: [DATA] "Path to the data file (- for stdin)")
                .value_parser(value_parser!(PathBuf)),
        ])
        .about("teddy renders Teddy HTML templates from the command line.")
        .after_help("Templates are plain HTML with <if>, <loop> and <include> directives.")
}
