use alfafin_core::Operation;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Notification formats known out of the box, most specific first.
pub const ALFABANK_TEMPLATES: &[(&str, Operation)] = &[
    // SMS, until August 2023
    (
        "Покупка {price} {currency}, {merchant}. Карта {card}. Баланс: {balance} ₽",
        Operation::Buy,
    ),
    // SMS, transliterated, from August 2023
    (
        "{card} Pokupka {price} {currency} Balans {balance} RUR {merchant_datetime}",
        Operation::Buy,
    ),
    // Push notification, from July 2024
    (
        "Покупка {card}: {price} {currency} в {merchant} Баланс: {balance}",
        Operation::Buy,
    ),
    // Manual entry
    ("{date} {price} {currency} - {merchant}", Operation::Buy),
    (
        "Отмена операции {price} {currency}, {merchant}. Карта {card}. Баланс: {balance} ₽",
        Operation::Cancel,
    ),
];

/// A placeholder a template may bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Price,
    Balance,
    Currency,
    Merchant,
    Card,
    Date,
    MerchantDatetime,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Price => "price",
            Field::Balance => "balance",
            Field::Currency => "currency",
            Field::Merchant => "merchant",
            Field::Card => "card",
            Field::Date => "date",
            Field::MerchantDatetime => "merchant_datetime",
        }
    }

    fn from_name(name: &str) -> Option<Field> {
        match name {
            "price" => Some(Field::Price),
            "balance" => Some(Field::Balance),
            "currency" => Some(Field::Currency),
            "merchant" => Some(Field::Merchant),
            "card" => Some(Field::Card),
            "date" => Some(Field::Date),
            "merchant_datetime" => Some(Field::MerchantDatetime),
            _ => None,
        }
    }

    // Tokens never contain whitespace; free text takes the shortest run that
    // lets the rest of the template match.
    fn capture(self) -> &'static str {
        match self {
            Field::Date => r"[0-9]{2}\.[0-9]{2}\.[0-9]{4}",
            Field::Currency | Field::Card => r"\S+",
            Field::Price | Field::Balance | Field::Merchant | Field::MerchantDatetime => r".+?",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template is empty")]
    Empty,
    #[error("Unknown placeholder {{{name}}} in template {template:?}")]
    UnknownPlaceholder { template: String, name: String },
    #[error("Unclosed placeholder in template {0:?}")]
    Unclosed(String),
    #[error("Placeholder {{{name}}} appears twice in template {template:?}")]
    Duplicate { template: String, name: String },
    #[error("Placeholders need literal text between them in template {0:?}")]
    Adjacent(String),
    #[error("Template {template:?} has no {{{field}}} placeholder")]
    MissingField { template: String, field: Field },
    #[error("Template {0:?} cannot bind both {{merchant}} and {{merchant_datetime}}")]
    ConflictingMerchant(String),
    #[error("Invalid template regex: {0}")]
    Regex(#[from] regex::Error),
    #[error("Failed to parse templates TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Configuration form of a template, as read from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub pattern: String,
    #[serde(default)]
    pub operation: Operation,
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    template: Vec<TemplateSpec>,
}

/// A literal-text pattern with `{field}` placeholders, compiled to an
/// anchored regex.
#[derive(Debug, Clone)]
pub struct Template {
    pattern: String,
    operation: Operation,
    fields: Vec<Field>,
    regex: Regex,
}

impl Template {
    pub fn compile(pattern: &str, operation: Operation) -> Result<Self, TemplateError> {
        if pattern.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut re = String::from("^");
        let mut fields: Vec<Field> = Vec::new();
        let mut literal = String::new();
        let mut after_placeholder = false;
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let close = rest[open..]
                .find('}')
                .map(|i| open + i)
                .ok_or_else(|| TemplateError::Unclosed(pattern.to_string()))?;
            let name = &rest[open + 1..close];
            let field = Field::from_name(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
                template: pattern.to_string(),
                name: name.to_string(),
            })?;
            if fields.contains(&field) {
                return Err(TemplateError::Duplicate {
                    template: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            if after_placeholder && literal.is_empty() {
                return Err(TemplateError::Adjacent(pattern.to_string()));
            }

            re.push_str(&regex::escape(&literal));
            literal.clear();
            re.push_str(&format!("(?P<{}>{})", field.name(), field.capture()));
            fields.push(field);
            after_placeholder = true;
            rest = &rest[close + 1..];
        }
        literal.push_str(rest);
        re.push_str(&regex::escape(&literal));
        re.push('$');

        for required in [Field::Price, Field::Currency] {
            if !fields.contains(&required) {
                return Err(TemplateError::MissingField {
                    template: pattern.to_string(),
                    field: required,
                });
            }
        }
        match (
            fields.contains(&Field::Merchant),
            fields.contains(&Field::MerchantDatetime),
        ) {
            (true, true) => return Err(TemplateError::ConflictingMerchant(pattern.to_string())),
            (false, false) => {
                return Err(TemplateError::MissingField {
                    template: pattern.to_string(),
                    field: Field::Merchant,
                })
            }
            _ => {}
        }

        Ok(Template {
            pattern: pattern.to_string(),
            operation,
            fields,
            regex: Regex::new(&re)?,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Binds every placeholder to a non-empty substring of `text`, or `None`
    /// when the literal parts do not line up.
    pub fn extract(&self, text: &str) -> Option<HashMap<Field, String>> {
        let caps = self.regex.captures(text)?;
        self.fields
            .iter()
            .map(|f| caps.name(f.name()).map(|m| (*f, m.as_str().to_string())))
            .collect()
    }
}

/// Raw field values extracted by the first template that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMatch {
    /// Position of the template in its set.
    pub index: usize,
    pub operation: Operation,
    pub fields: HashMap<Field, String>,
}

impl TemplateMatch {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

/// Ordered list of templates. Order is the disambiguation policy: the first
/// template that matches wins.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl TemplateSet {
    pub fn new(specs: Vec<TemplateSpec>) -> Result<Self, TemplateError> {
        let templates = specs
            .iter()
            .map(|s| Template::compile(&s.pattern, s.operation))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    pub fn alfabank() -> Result<Self, TemplateError> {
        Self::new(
            ALFABANK_TEMPLATES
                .iter()
                .map(|(pattern, operation)| TemplateSpec {
                    pattern: pattern.to_string(),
                    operation: *operation,
                })
                .collect(),
        )
    }

    /// Reads `[[template]]` tables, each with a `pattern` and an optional
    /// `operation` (`"buy"` by default).
    pub fn from_toml(toml_content: &str) -> Result<Self, TemplateError> {
        let file: TemplateFile = toml::from_str(toml_content)?;
        Self::new(file.template)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn find(&self, text: &str) -> Option<TemplateMatch> {
        self.templates.iter().enumerate().find_map(|(index, t)| {
            t.extract(text).map(|fields| TemplateMatch {
                index,
                operation: t.operation(),
                fields,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> TemplateSet {
        TemplateSet::alfabank().unwrap()
    }

    fn field<'a>(m: &'a TemplateMatch, f: Field) -> &'a str {
        m.get(f).unwrap()
    }

    #[test]
    fn builtin_set_compiles_in_order() {
        let s = set();
        assert_eq!(s.len(), ALFABANK_TEMPLATES.len());
        assert_eq!(s.iter().last().unwrap().operation(), Operation::Cancel);
    }

    #[test]
    fn sms_before_2023_08() {
        let m = set()
            .find("Покупка 5 271.17 ₽, Озон. Карта **1111. Баланс: 4 506.22 ₽")
            .unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.operation, Operation::Buy);
        assert_eq!(field(&m, Field::Price), "5 271.17");
        assert_eq!(field(&m, Field::Currency), "₽");
        assert_eq!(field(&m, Field::Merchant), "Озон");
        assert_eq!(field(&m, Field::Card), "**1111");
        assert_eq!(field(&m, Field::Balance), "4 506.22");
    }

    #[test]
    fn sms_after_2023_08() {
        let m = set()
            .find("**1111 Pokupka 1 234 567 AMD Balans 10 000,12 RUR YANDEX GO 16.08.2023 07:36")
            .unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(field(&m, Field::Card), "**1111");
        assert_eq!(field(&m, Field::Price), "1 234 567");
        assert_eq!(field(&m, Field::Currency), "AMD");
        assert_eq!(field(&m, Field::Balance), "10 000,12");
        assert_eq!(field(&m, Field::MerchantDatetime), "YANDEX GO 16.08.2023 07:36");
    }

    #[test]
    fn push_after_2024_07_with_preposition_in_merchant() {
        let m = set()
            .find("Покупка **1111: 350 ₽ в Кофе в зёрнах Баланс: 12 345,67 ₽")
            .unwrap();
        assert_eq!(m.index, 2);
        assert_eq!(field(&m, Field::Price), "350");
        assert_eq!(field(&m, Field::Currency), "₽");
        assert_eq!(field(&m, Field::Merchant), "Кофе в зёрнах");
        assert_eq!(field(&m, Field::Balance), "12 345,67 ₽");
    }

    #[test]
    fn manual_entry() {
        let m = set().find("16.08.2023 1 000 USD - Кафе - бар").unwrap();
        assert_eq!(m.index, 3);
        assert_eq!(field(&m, Field::Date), "16.08.2023");
        assert_eq!(field(&m, Field::Price), "1 000");
        assert_eq!(field(&m, Field::Currency), "USD");
        assert_eq!(field(&m, Field::Merchant), "Кафе - бар");
    }

    #[test]
    fn cancellation_is_tagged() {
        let m = set()
            .find("Отмена операции 527,11 ₽, Озон. Карта **1111. Баланс: 4506,85 ₽")
            .unwrap();
        assert_eq!(m.operation, Operation::Cancel);
        assert_eq!(field(&m, Field::Price), "527,11");
    }

    #[test]
    fn cancellation_with_dashed_merchant_is_not_manual_entry() {
        let m = set()
            .find("Отмена операции 527,11 ₽, Кафе - бар. Карта **1111. Баланс: 4506,85 ₽")
            .unwrap();
        assert_eq!(m.index, 4);
        assert_eq!(m.operation, Operation::Cancel);
        assert_eq!(field(&m, Field::Price), "527,11");
        assert_eq!(field(&m, Field::Merchant), "Кафе - бар");
    }

    #[test]
    fn date_placeholder_takes_only_a_date() {
        let s = set();
        assert!(s.find("вчера 100 ₽ - Кафе").is_none());
        assert!(s.find("16.08.23 100 ₽ - Кафе").is_none());
        assert_eq!(s.find("16.08.2023 100 ₽ - Кафе").unwrap().index, 3);
    }

    #[test]
    fn first_match_wins_over_later_general_template() {
        let specific = r#"
            [[template]]
            pattern = "Refund {price} {currency} - {merchant}"
            operation = "cancel"

            [[template]]
            pattern = "{price} {currency} - {merchant}"
            "#;
        let m = TemplateSet::from_toml(specific).unwrap().find("Refund 10 USD - Shop").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.operation, Operation::Cancel);
        assert_eq!(field(&m, Field::Price), "10");

        let general = r#"
            [[template]]
            pattern = "{price} {currency} - {merchant}"

            [[template]]
            pattern = "Refund {price} {currency} - {merchant}"
            operation = "cancel"
            "#;
        let m = TemplateSet::from_toml(general).unwrap().find("Refund 10 USD - Shop").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.operation, Operation::Buy);
        assert_eq!(field(&m, Field::Price), "Refund 10");
    }

    #[test]
    fn unrecognized_text() {
        let s = set();
        assert!(s.find("").is_none());
        assert!(s.find("ABC").is_none());
        assert!(s.find("Покупка ₽, Озон. Карта **1111. Баланс: 4506,85 ₽").is_none());
        assert!(s.find("Деньги пришли! 20 000 ₽ на карту **1111. Баланс: 21 945,39 ₽").is_none());
    }

    #[test]
    fn literal_punctuation_must_match_exactly() {
        assert!(set()
            .find("Покупка 527,11 ₽, Озон Карта **1111. Баланс: 4506,85 ₽")
            .is_none());
    }

    #[test]
    fn regex_metacharacters_in_literals_are_escaped() {
        let t = Template::compile("Pay (x) {price}$ {currency} at {merchant}.", Operation::Buy)
            .unwrap();
        let fields = t.extract("Pay (x) 10$ USD at Shop.").unwrap();
        assert_eq!(fields[&Field::Price], "10");
        assert!(t.extract("Pay x 10$ USD at Shop.").is_none());
    }

    #[test]
    fn compile_errors() {
        assert!(matches!(
            Template::compile("{price} {currency} {shop}", Operation::Buy),
            Err(TemplateError::UnknownPlaceholder { name, .. }) if name == "shop"
        ));
        assert!(matches!(
            Template::compile("{price} {currency} {merchant", Operation::Buy),
            Err(TemplateError::Unclosed(_))
        ));
        assert!(matches!(
            Template::compile("{price}{currency} {merchant}", Operation::Buy),
            Err(TemplateError::Adjacent(_))
        ));
        assert!(matches!(
            Template::compile("{price} {price} {currency} {merchant}", Operation::Buy),
            Err(TemplateError::Duplicate { .. })
        ));
        assert!(matches!(
            Template::compile("{currency} {merchant}", Operation::Buy),
            Err(TemplateError::MissingField { field: Field::Price, .. })
        ));
        assert!(matches!(
            Template::compile("{price} {currency} {merchant} {merchant_datetime}", Operation::Buy),
            Err(TemplateError::ConflictingMerchant(_))
        ));
        assert!(matches!(Template::compile("", Operation::Buy), Err(TemplateError::Empty)));
    }

    #[test]
    fn from_toml_keeps_order_and_operations() {
        let s = TemplateSet::from_toml(
            r#"
            [[template]]
            pattern = "Refund {price} {currency} from {merchant}"
            operation = "cancel"

            [[template]]
            pattern = "Paid {price} {currency} to {merchant}"
            "#,
        )
        .unwrap();
        assert_eq!(s.len(), 2);

        let m = s.find("Paid 10 USD to Shop").unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.operation, Operation::Buy);

        let m = s.find("Refund 10 USD from Shop").unwrap();
        assert_eq!(m.operation, Operation::Cancel);
    }

    #[test]
    fn from_toml_rejects_bad_template() {
        let err = TemplateSet::from_toml(
            r#"
            [[template]]
            pattern = "{amount} {currency} {merchant}"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPlaceholder { .. }));
    }
}
