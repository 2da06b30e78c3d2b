//! Person attributes and the provider-to-canonical transform.
//!
//! The provider keys attributes by short wire names (`uinfin`, `mobileno`,
//! `regadd`, ...). The connector exposes them under canonical camelCase
//! names. Composite attributes (phone number, address, driving licence) are
//! destructured into typed records, and anything that ends up empty is
//! dropped rather than returned with blank leaves.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::SgVerifyError;

/// Raw person payload as returned by the provider, keyed by wire name.
pub type RawPersonData = Map<String, Value>;

// ============================================================================
// Attribute table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PersonAttribute {
    PartialNricFin,
    NricFin,
    Uuid,
    Name,
    AliasName,
    HanyuPinyinName,
    HanyuPinyinAliasName,
    MarriedName,
    Gender,
    Race,
    SecondaryRace,
    DateOfBirth,
    ResidentialStatus,
    Nationality,
    BirthCountry,
    PassportNumber,
    PassType,
    PassStatus,
    PassExpiryDate,
    MobileNumber,
    Email,
    Address,
    Employment,
    DrivingLicence,
}

/// (attribute, wire key, canonical key), indexed by discriminant.
static ATTRIBUTES: [(PersonAttribute, &str, &str); 24] = [
    (PersonAttribute::PartialNricFin, "partialuinfin", "partialNricFin"),
    (PersonAttribute::NricFin, "uinfin", "nricFin"),
    (PersonAttribute::Uuid, "uuid", "uuid"),
    (PersonAttribute::Name, "name", "name"),
    (PersonAttribute::AliasName, "aliasname", "aliasName"),
    (PersonAttribute::HanyuPinyinName, "hanyupinyinname", "hanyuPinyinName"),
    (PersonAttribute::HanyuPinyinAliasName, "hanyupinyinaliasname", "hanyuPinyinAliasName"),
    (PersonAttribute::MarriedName, "marriedname", "marriedName"),
    (PersonAttribute::Gender, "sex", "gender"),
    (PersonAttribute::Race, "race", "race"),
    (PersonAttribute::SecondaryRace, "secondaryrace", "secondaryRace"),
    (PersonAttribute::DateOfBirth, "dob", "dateOfBirth"),
    (PersonAttribute::ResidentialStatus, "residentialstatus", "residentialStatus"),
    (PersonAttribute::Nationality, "nationality", "nationality"),
    (PersonAttribute::BirthCountry, "birthcountry", "birthCountry"),
    (PersonAttribute::PassportNumber, "passportnumber", "passportNumber"),
    (PersonAttribute::PassType, "passtype", "passType"),
    (PersonAttribute::PassStatus, "passstatus", "passStatus"),
    (PersonAttribute::PassExpiryDate, "passexpirydate", "passExpiryDate"),
    (PersonAttribute::MobileNumber, "mobileno", "mobileNumber"),
    (PersonAttribute::Email, "email", "email"),
    (PersonAttribute::Address, "regadd", "address"),
    (PersonAttribute::Employment, "employment", "employment"),
    (PersonAttribute::DrivingLicence, "drivinglicence", "drivingLicence"),
];

static BY_WIRE_KEY: LazyLock<HashMap<&'static str, PersonAttribute>> =
    LazyLock::new(|| ATTRIBUTES.iter().map(|(attr, wire, _)| (*wire, *attr)).collect());

static BY_CANONICAL_KEY: LazyLock<HashMap<&'static str, PersonAttribute>> =
    LazyLock::new(|| ATTRIBUTES.iter().map(|(attr, _, key)| (*key, *attr)).collect());

impl PersonAttribute {
    pub fn all() -> impl Iterator<Item = PersonAttribute> {
        ATTRIBUTES.iter().map(|(attr, _, _)| *attr)
    }

    /// Name used by the provider API.
    pub fn wire_key(self) -> &'static str {
        ATTRIBUTES[self as usize].1
    }

    /// Name used in [`PersonData`].
    pub fn canonical_key(self) -> &'static str {
        ATTRIBUTES[self as usize].2
    }

    pub fn from_wire_key(key: &str) -> Option<Self> {
        BY_WIRE_KEY.get(key).copied()
    }

    pub fn from_canonical_key(key: &str) -> Option<Self> {
        BY_CANONICAL_KEY.get(key).copied()
    }
}

impl fmt::Display for PersonAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_key())
    }
}

/// Accepts either the wire key or the canonical key.
impl FromStr for PersonAttribute {
    type Err = SgVerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire_key(s)
            .or_else(|| Self::from_canonical_key(s))
            .ok_or_else(|| SgVerifyError::Config(format!("unknown person attribute: {}", s)))
    }
}

impl Serialize for PersonAttribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.canonical_key())
    }
}

impl<'de> Deserialize<'de> for PersonAttribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// Comma-joined wire keys for the `attributes` query parameter.
pub fn attributes_param(attributes: &[PersonAttribute]) -> String {
    attributes
        .iter()
        .map(|attr| attr.wire_key())
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// Person record
// ============================================================================

/// A code/value pair, e.g. `{ code: "F", value: "FEMALE" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl CodeValue {
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.value.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PhoneNumber {
    pub fn is_empty(&self) -> bool {
        self.prefix.is_none() && self.area_code.is_none() && self.value.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<CodeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.country.is_none()
            && self.block.is_none()
            && self.building.is_none()
            && self.floor_number.is_none()
            && self.unit_number.is_none()
            && self.street.is_none()
            && self.postal_code.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenceClass {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivingLicence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<CodeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<LicenceClass>,
}

impl DrivingLicence {
    pub fn is_empty(&self) -> bool {
        self.validity.is_none() && self.expiry_date.is_none() && self.classes.is_empty()
    }
}

/// The value of one person attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PersonField {
    Value(CodeValue),
    PhoneNumber(PhoneNumber),
    Address(Address),
    DrivingLicence(DrivingLicence),
}

impl PersonField {
    pub fn is_empty(&self) -> bool {
        match self {
            PersonField::Value(field) => field.is_empty(),
            PersonField::PhoneNumber(field) => field.is_empty(),
            PersonField::Address(field) => field.is_empty(),
            PersonField::DrivingLicence(field) => field.is_empty(),
        }
    }
}

/// Transformed person record. Only non-empty attributes are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PersonData(BTreeMap<PersonAttribute, PersonField>);

impl PersonData {
    pub fn get(&self, attribute: PersonAttribute) -> Option<&PersonField> {
        self.0.get(&attribute)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PersonAttribute, &PersonField)> {
        self.0.iter()
    }

    /// Shorthand for the `value` of a simple attribute.
    pub fn value(&self, attribute: PersonAttribute) -> Option<&str> {
        match self.get(attribute)? {
            PersonField::Value(field) => field.value.as_deref(),
            PersonField::PhoneNumber(field) => field.value.as_deref(),
            _ => None,
        }
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Map a raw provider payload into a [`PersonData`].
///
/// Unknown keys are ignored. A field whose sub-values are all missing or
/// empty is omitted.
pub fn transform_person_data(raw: &RawPersonData) -> PersonData {
    let mut person = BTreeMap::new();

    for (key, value) in raw {
        let Some(attribute) = PersonAttribute::from_wire_key(key) else {
            continue;
        };
        if !value.is_object() {
            continue;
        }

        let field = match attribute {
            PersonAttribute::MobileNumber => PersonField::PhoneNumber(phone_number(value)),
            PersonAttribute::Address => PersonField::Address(address(value)),
            PersonAttribute::DrivingLicence => PersonField::DrivingLicence(driving_licence(value)),
            _ => PersonField::Value(code_value(value)),
        };

        if !field.is_empty() {
            person.insert(attribute, field);
        }
    }

    PersonData(person)
}

/// Non-empty string (or number) at `value[key]`.
fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A leaf that may be a bare string or a `{ value }` object.
fn leaf(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Object(_) => text(&value[key], "value"),
        _ => text(value, key),
    }
}

/// `{ code, desc | value }`; `desc` wins over `value` when both are present.
fn code_value(value: &Value) -> CodeValue {
    CodeValue {
        code: text(value, "code"),
        value: text(value, "desc").or_else(|| text(value, "value")),
    }
}

fn optional_code_value(value: Option<&Value>) -> Option<CodeValue> {
    value.map(code_value).filter(|cv| !cv.is_empty())
}

fn phone_number(value: &Value) -> PhoneNumber {
    PhoneNumber {
        prefix: leaf(value, "prefix"),
        area_code: leaf(value, "areacode"),
        value: leaf(value, "nbr"),
    }
}

fn address(value: &Value) -> Address {
    Address {
        country: optional_code_value(value.get("country")),
        block: leaf(value, "block"),
        building: leaf(value, "building"),
        floor_number: leaf(value, "floor"),
        unit_number: leaf(value, "unit"),
        street: leaf(value, "street"),
        postal_code: leaf(value, "postal"),
    }
}

fn driving_licence(value: &Value) -> DrivingLicence {
    let Some(qdl) = value.get("qdl") else {
        return DrivingLicence::default();
    };

    let classes = qdl
        .get("classes")
        .and_then(Value::as_array)
        .map(|classes| {
            classes
                .iter()
                .map(|entry| LicenceClass {
                    class: leaf(entry, "class"),
                    issue_date: leaf(entry, "issuedate"),
                })
                .filter(|entry| entry.class.is_some() || entry.issue_date.is_some())
                .collect()
        })
        .unwrap_or_default();

    DrivingLicence {
        validity: optional_code_value(qdl.get("validity")),
        expiry_date: leaf(qdl, "expirydate"),
        classes,
    }
}
