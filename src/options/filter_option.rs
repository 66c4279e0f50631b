use crate::options::error::OptionError;
use crate::options::value::{OptionValue, RawValue, Scalar};
use bon::Builder;
use chrono::{NaiveDate, NaiveDateTime};
use log::warn;

/// Date format used by date options unless overridden.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// How a date option turns strings into calendar values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    /// A `chrono` format string, e.g. `%Y-%m-%d`.
    pub format: String,
    /// Drop any time-of-day component after parsing.
    pub date_only: bool,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            format: DEFAULT_DATE_FORMAT.to_string(),
            date_only: true,
        }
    }
}

impl DateFormat {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            date_only: true,
        }
    }

    pub fn keep_time(mut self) -> Self {
        self.date_only = false;
        self
    }
}

/// The validation flavour of an option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    /// Free-form values, passed through unchanged.
    Text,
    /// Strings are parsed into dates.
    Date(DateFormat),
    /// Values must be members of a closed set.
    Choice(Vec<String>),
}

/// One named, validated request parameter.
///
/// Options are declared without a name; [`crate::Schema::with`] binds the name it is
/// registered under.
///
/// # Examples
///
/// ```
/// use climata::FilterOption;
///
/// let station = FilterOption::text().wire_name("site").multi(true).build();
/// assert_eq!(station.wire_name(), "site");
/// assert!(station.is_multi());
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct FilterOption {
    #[builder(start_fn)]
    kind: OptionKind,

    #[builder(skip)]
    name: String,

    /// Parameter name sent to the remote service. Falls back to the option name.
    #[builder(into)]
    wire_name: Option<String>,

    /// Absence of a value is an error.
    #[builder(default)]
    required: bool,

    /// More than one value is accepted.
    #[builder(default)]
    multi: bool,

    /// The option does not apply to this service; supplied values are dropped.
    #[builder(default)]
    ignored: bool,

    /// Used when the caller supplies nothing.
    #[builder(into)]
    default_value: Option<RawValue>,
}

impl FilterOption {
    pub fn text() -> FilterOptionBuilder {
        Self::builder(OptionKind::Text)
    }

    /// A date option using [`DEFAULT_DATE_FORMAT`].
    pub fn date() -> FilterOptionBuilder {
        Self::builder(OptionKind::Date(DateFormat::default()))
    }

    pub fn date_with_format(format: DateFormat) -> FilterOptionBuilder {
        Self::builder(OptionKind::Date(format))
    }

    pub fn choice<I, S>(choices: I) -> FilterOptionBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder(OptionKind::Choice(
            choices.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bind_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn wire_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub fn default_value(&self) -> Option<&RawValue> {
        self.default_value.as_ref()
    }

    /// A copy of this option that ignores supplied values, keeping its kind.
    pub fn into_ignored(mut self) -> Self {
        self.ignored = true;
        self.required = false;
        self
    }

    /// Enforces the option rules and returns the normalized value.
    ///
    /// Ignored options only have their shape normalized; a warning is logged and the
    /// value is handed back so the caller can decide to drop it. A single-valued ignored
    /// option given several values keeps the first one instead of failing.
    pub fn parse(&self, raw: Option<RawValue>) -> Result<Option<OptionValue>, OptionError> {
        let Some(raw) = raw else {
            return self.absent();
        };

        if self.ignored {
            warn!("{} is ignored for this service!", self.name);
            return self.shape(raw);
        }

        match self.shape(raw)? {
            Some(value) => self.refine(value).map(Some),
            None => Ok(None),
        }
    }

    /// Applies the multiplicity rule: scalars become lists for multi options, and lists
    /// collapse to one value for single options.
    fn shape(&self, raw: RawValue) -> Result<Option<OptionValue>, OptionError> {
        Ok(Some(match raw {
            RawValue::Scalar(value) if self.multi => OptionValue::Many(vec![value]),
            RawValue::Scalar(value) => OptionValue::Single(value),
            RawValue::List(values) if self.multi => OptionValue::Many(values),
            RawValue::List(values) => {
                let count = values.len();
                if count > 1 && !self.ignored {
                    return Err(OptionError::Multiplicity {
                        name: self.name.clone(),
                        count,
                    });
                }
                match values.into_iter().next() {
                    Some(value) => OptionValue::Single(value),
                    None => return self.absent(),
                }
            }
        }))
    }

    fn absent(&self) -> Result<Option<OptionValue>, OptionError> {
        if self.required && !self.ignored {
            Err(OptionError::MissingRequiredValue {
                name: self.name.clone(),
            })
        } else {
            Ok(None)
        }
    }

    fn refine(&self, value: OptionValue) -> Result<OptionValue, OptionError> {
        match &self.kind {
            OptionKind::Text => Ok(value),
            OptionKind::Date(format) => match value {
                OptionValue::Single(value) => {
                    Ok(OptionValue::Single(self.parse_date(value, format)?))
                }
                OptionValue::Many(values) => values
                    .into_iter()
                    .map(|value| self.parse_date(value, format))
                    .collect::<Result<Vec<_>, _>>()
                    .map(OptionValue::Many),
            },
            OptionKind::Choice(choices) => {
                for candidate in value.as_list() {
                    let text = candidate.to_string();
                    if !choices.iter().any(|choice| *choice == text) {
                        return Err(OptionError::InvalidChoice {
                            name: self.name.clone(),
                            value: text,
                            choices: choices.clone(),
                        });
                    }
                }
                Ok(value)
            }
        }
    }

    fn parse_date(&self, value: Scalar, format: &DateFormat) -> Result<Scalar, OptionError> {
        let parsed = match value {
            Scalar::Text(text) => parse_date_text(&text, format).ok_or_else(|| {
                OptionError::DateParse {
                    name: self.name.clone(),
                    value: text.clone(),
                    format: format.format.clone(),
                }
            })?,
            Scalar::Date(date) => Scalar::Date(date),
            Scalar::DateTime(datetime) => Scalar::DateTime(datetime),
            other => {
                return Err(OptionError::DateParse {
                    name: self.name.clone(),
                    value: other.to_string(),
                    format: format.format.clone(),
                })
            }
        };

        Ok(match parsed {
            Scalar::DateTime(datetime) if format.date_only => Scalar::Date(datetime.date()),
            other => other,
        })
    }
}

/// Parses a date or date-time string with the given format.
///
/// Formats without a time component yield [`Scalar::Date`]; formats with one yield
/// [`Scalar::DateTime`]. Truncation is left to the caller.
fn parse_date_text(text: &str, format: &DateFormat) -> Option<Scalar> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, &format.format) {
        return Some(Scalar::DateTime(datetime));
    }
    NaiveDate::parse_from_str(text, &format.format)
        .ok()
        .map(Scalar::Date)
}
