//! Engine configuration.
//!
//! [`Config`] is threaded explicitly through every entry point. It can be
//! built in code with the `with_*` builders or parsed from the classic
//! command-line spellings:
//!
//! | option                 | effect                                         |
//! |------------------------|------------------------------------------------|
//! | `--template-depth N`   | maximum nested instantiation depth (default 17) |
//! | `--pseudo-instances`   | stop at pseudo-instances, never build bodies   |
//! | `--inst-fct-bodies`    | build definitions of function template instances |
//! | `--no-inst-fct-bodies` | only declare function template instances       |

use crate::ConfigError;

/// Default bound on nested instantiations of one template.
pub const DEFAULT_MAX_INSTANTIATION_DEPTH: u32 = 17;

/// How far instantiation proceeds once a new instance is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstantiationMode {
    /// Build the full definition right away.
    #[default]
    Eager,
    /// Only register signature-level pseudo-instances.
    PseudoOnly,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nesting bound per template entity.
    pub max_instantiation_depth: u32,
    /// Eager or declaration-only instantiation.
    pub instantiation: InstantiationMode,
    /// Whether function template instances get their body built.
    pub instantiate_function_bodies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_instantiation_depth: DEFAULT_MAX_INSTANTIATION_DEPTH,
            instantiation: InstantiationMode::Eager,
            instantiate_function_bodies: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_instantiation_depth(mut self, depth: u32) -> Self {
        self.max_instantiation_depth = depth;
        self
    }

    pub fn with_instantiation_mode(mut self, mode: InstantiationMode) -> Self {
        self.instantiation = mode;
        self
    }

    pub fn with_function_bodies(mut self, enabled: bool) -> Self {
        self.instantiate_function_bodies = enabled;
        self
    }

    /// Whether definitions are built at all.
    pub fn builds_definitions(&self) -> bool {
        self.instantiation == InstantiationMode::Eager
    }

    /// Parse command-line style options on top of the defaults.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Config::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            let arg = arg.as_ref();
            match arg {
                "--template-depth" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| ConfigError::MissingValue(arg.to_string()))?;
                    config.max_instantiation_depth = parse_depth(arg, value.as_ref())?;
                }
                "--pseudo-instances" => config.instantiation = InstantiationMode::PseudoOnly,
                "--inst-fct-bodies" => config.instantiate_function_bodies = true,
                "--no-inst-fct-bodies" => config.instantiate_function_bodies = false,
                _ => match arg.strip_prefix("--template-depth=") {
                    Some(value) => config.max_instantiation_depth = parse_depth("--template-depth", value)?,
                    None => return Err(ConfigError::UnknownOption(arg.to_string())),
                },
            }
        }
        Ok(config)
    }
}

fn parse_depth(option: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    })
}
