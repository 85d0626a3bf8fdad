use crate::error::OptionsError;

/// How a valued flag appeared on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OptionValue {
    #[default]
    Absent,
    Empty,
    Given(String),
}

impl From<Option<Option<String>>> for OptionValue {
    fn from(value: Option<Option<String>>) -> Self {
        match value {
            None => OptionValue::Absent,
            Some(None) => OptionValue::Empty,
            Some(Some(v)) => OptionValue::Given(v),
        }
    }
}

impl OptionValue {
    /// The value to filter by, if there is a usable one.
    pub fn value(&self) -> Option<&str> {
        match self {
            OptionValue::Given(v) if !v.is_empty() => Some(v),
            _ => None,
        }
    }
}

pub struct OptionDef {
    pub name: &'static str,
    pub required: bool,
}

pub const OPTION_DEFS: &[OptionDef] = &[
    OptionDef { name: "help", required: false },
    OptionDef { name: "bucket", required: false },
    OptionDef { name: "prefix", required: false },
    OptionDef { name: "abort", required: false },
    OptionDef { name: "force", required: false },
];

#[derive(Debug, Default, Clone)]
pub struct Options {
    pub bucket: OptionValue,
    pub prefix: OptionValue,
    pub abort: bool,
    pub force: bool,
}

impl Options {
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.value()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.value()
    }

    /// Switches always have a value once parsed, so only valued flags can
    /// fail here.
    fn state(&self, name: &str) -> OptionValue {
        match name {
            "bucket" => self.bucket.clone(),
            "prefix" => self.prefix.clone(),
            _ => OptionValue::Given(String::new()),
        }
    }

    pub fn validate(&self, defs: &[OptionDef]) -> Result<(), OptionsError> {
        for def in defs.iter().filter(|def| def.required) {
            match self.state(def.name) {
                OptionValue::Absent => return Err(OptionsError::Missing(def.name)),
                OptionValue::Empty => return Err(OptionsError::MissingArgument(def.name)),
                OptionValue::Given(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUCKET_REQUIRED: &[OptionDef] = &[
        OptionDef { name: "bucket", required: true },
        OptionDef { name: "prefix", required: false },
    ];

    #[test]
    fn shipped_definitions_require_nothing() {
        assert!(Options::default().validate(OPTION_DEFS).is_ok());
    }

    #[test]
    fn missing_required_option() {
        let err = Options::default().validate(BUCKET_REQUIRED).unwrap_err();

        assert_eq!(err, OptionsError::Missing("bucket"));
        assert_eq!(err.to_string(), "Option --bucket is required!");
    }

    #[test]
    fn argumentless_required_option() {
        let options = Options {
            bucket: OptionValue::Empty,
            ..Default::default()
        };
        let err = options.validate(BUCKET_REQUIRED).unwrap_err();

        assert_eq!(err, OptionsError::MissingArgument("bucket"));
        assert_eq!(err.to_string(), "Option --bucket requires an argument!");
    }

    #[test]
    fn given_required_option() {
        let options = Options {
            bucket: OptionValue::Given("photos".to_string()),
            ..Default::default()
        };
        assert!(options.validate(BUCKET_REQUIRED).is_ok());
    }

    #[test]
    fn empty_values_do_not_filter() {
        let options = Options {
            bucket: OptionValue::Empty,
            prefix: OptionValue::Given(String::new()),
            ..Default::default()
        };

        assert_eq!(options.bucket(), None);
        assert_eq!(options.prefix(), None);
    }

    #[test]
    fn tri_state_from_clap() {
        assert_eq!(OptionValue::from(None), OptionValue::Absent);
        assert_eq!(OptionValue::from(Some(None)), OptionValue::Empty);
        assert_eq!(
            OptionValue::from(Some(Some("tmp/".to_string()))),
            OptionValue::Given("tmp/".to_string())
        );
    }
}
