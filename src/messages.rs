//! User-facing workflow messages.
//!
//! Every string the workflow shows to a person lives here, keyed by
//! [`Locale`], so wording changes touch exactly one file and tests can
//! assert on the exact text.

use crate::config::Locale;

/// Localized message set handed to [`crate::workflow::Workflow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Discovery failed for `extension` (unknown to the registry, or the
    /// registry was unreachable).
    pub fn unsupported_format(&self, extension: &str) -> String {
        match self.locale {
            Locale::En => format!("Format '{extension}' is not supported for conversion"),
            Locale::Ru => format!("Формат {extension} не поддерживается для конвертации"),
        }
    }

    /// Fallback when a conversion error carries no message of its own.
    pub fn conversion_failed(&self) -> &'static str {
        match self.locale {
            Locale::En => "Conversion failed",
            Locale::Ru => "Ошибка конвертации",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_names_the_extension() {
        let m = Messages::new(Locale::En);
        assert_eq!(
            m.unsupported_format("xyz"),
            "Format 'xyz' is not supported for conversion"
        );
    }

    #[test]
    fn russian_names_the_extension() {
        let m = Messages::new(Locale::Ru);
        assert_eq!(
            m.unsupported_format("xyz"),
            "Формат xyz не поддерживается для конвертации"
        );
        assert_eq!(m.conversion_failed(), "Ошибка конвертации");
    }

    #[test]
    fn default_is_english() {
        assert_eq!(Messages::default().locale(), Locale::En);
        assert_eq!(Messages::default().conversion_failed(), "Conversion failed");
    }
}
