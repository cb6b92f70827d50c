//! Codecs JSON da API Kaonavi
//!
//! O formato de fio da Kaonavi tem algumas representações que o mapeamento
//! padrão do serde não cobre:
//!
//! - Datas `YYYY-MM-DD` onde string vazia significa "sem valor" (e é assim
//!   que o ausente deve ser enviado de volta, nunca `null`)
//! - Data+hora `YYYY-MM-DD HH:mm:ss` sem offset de timezone
//! - Enums identificados por string literal (`member_created`, `OK`, ...)
//! - Enums identificados por ordinal (`record_type: 0 | 1`)
//!
//! Todos os decodes falham com [`CodecError`] informando o campo e o valor
//! bruto. Nenhum valor desconhecido é convertido silenciosamente em default.
//! Dentro de um documento, o caminho completo do campo (`member_data[0].birthday`)
//! é acrescentado por [`crate::envelope::decode_document`].

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Formato de data do fio
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formato de data+hora do fio (horário local, sem offset)
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_SHAPE: &str = "dddd-dd-dd";
const DATE_TIME_SHAPE: &str = "dddd-dd-dd dd:dd:dd";

/// Falha estruturada de decode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("field `{field}`: invalid date `{raw}` (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, raw: String },

    #[error("field `{field}`: invalid date-time `{raw}` (expected YYYY-MM-DD HH:mm:ss)")]
    InvalidDateTime { field: &'static str, raw: String },

    #[error("field `{field}`: unknown tag `{raw}`")]
    UnknownTag { field: &'static str, raw: String },

    #[error("field `{field}`: unknown ordinal `{raw}`")]
    UnknownOrdinal { field: &'static str, raw: String },

    /// Ano fora de 0000..=9999 não cabe no formato de fio
    #[error("field `{field}`: `{raw}` is outside the supported years 0000-9999")]
    OutOfRange { field: &'static str, raw: String },
}

impl CodecError {
    /// Valor bruto que causou a falha
    pub fn raw(&self) -> &str {
        match self {
            Self::InvalidDate { raw, .. }
            | Self::InvalidDateTime { raw, .. }
            | Self::UnknownTag { raw, .. }
            | Self::UnknownOrdinal { raw, .. }
            | Self::OutOfRange { raw, .. } => raw,
        }
    }

    /// Nome do campo que falhou
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidDate { field, .. }
            | Self::InvalidDateTime { field, .. }
            | Self::UnknownTag { field, .. }
            | Self::UnknownOrdinal { field, .. }
            | Self::OutOfRange { field, .. } => field,
        }
    }
}

// `d` = dígito ASCII, qualquer outro caractere é literal.
// chrono aceita componentes sem zero à esquerda; o fio não.
fn has_shape(raw: &str, shape: &str) -> bool {
    raw.len() == shape.len()
        && raw.bytes().zip(shape.bytes()).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            literal => c == literal,
        })
}

/// Decodifica uma data; `None` (JSON null) e `""` são ambos "sem valor"
pub fn decode_date(raw: Option<&str>) -> Result<Option<NaiveDate>, CodecError> {
    decode_date_field("date", raw)
}

/// [`decode_date`] informando o nome do campo no erro
pub fn decode_date_field(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveDate>, CodecError> {
    match raw {
        None | Some("") => Ok(None),
        Some(text) => {
            let invalid = || CodecError::InvalidDate {
                field,
                raw: text.to_string(),
            };
            if !has_shape(text, DATE_SHAPE) {
                return Err(invalid());
            }
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(Some)
                .map_err(|_| invalid())
        }
    }
}

/// Anos que o formato de fio (`YYYY`) representa
const WIRE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Codifica uma data; ausente vira `""`
///
/// Anos fora de 0000..=9999 falham em vez de produzir algo que o decode
/// rejeitaria.
pub fn encode_date(value: Option<NaiveDate>) -> Result<String, CodecError> {
    match value {
        None => Ok(String::new()),
        Some(date) if !WIRE_YEARS.contains(&date.year()) => Err(CodecError::OutOfRange {
            field: "date",
            raw: date.to_string(),
        }),
        Some(date) => Ok(date.format(DATE_FORMAT).to_string()),
    }
}

/// Decodifica `YYYY-MM-DD HH:mm:ss`
pub fn decode_date_time(raw: &str) -> Result<NaiveDateTime, CodecError> {
    decode_date_time_field("date_time", raw)
}

/// [`decode_date_time`] informando o nome do campo no erro
pub fn decode_date_time_field(field: &'static str, raw: &str) -> Result<NaiveDateTime, CodecError> {
    let invalid = || CodecError::InvalidDateTime {
        field,
        raw: raw.to_string(),
    };
    if !has_shape(raw, DATE_TIME_SHAPE) {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT).map_err(|_| invalid())
}

/// Inverso exato de [`decode_date_time`], com a mesma faixa de anos de [`encode_date`]
pub fn encode_date_time(value: &NaiveDateTime) -> Result<String, CodecError> {
    if !WIRE_YEARS.contains(&value.year()) {
        return Err(CodecError::OutOfRange {
            field: "date_time",
            raw: value.to_string(),
        });
    }
    Ok(value.format(DATE_TIME_FORMAT).to_string())
}

/// Enum identificado no fio por uma string literal
///
/// Implementações devem mapear as duas direções com `match` explícito e
/// comparar bytes exatos (case-sensitive).
pub trait TaggedEnum: Sized + Copy {
    /// Nome do campo usado nas mensagens de erro
    const FIELD: &'static str;

    fn tag(self) -> &'static str;

    fn from_tag(raw: &str) -> Option<Self>;
}

/// Decodifica uma tag; literal fora do conjunto é erro
pub fn decode_tag<E: TaggedEnum>(raw: &str) -> Result<E, CodecError> {
    E::from_tag(raw).ok_or_else(|| CodecError::UnknownTag {
        field: E::FIELD,
        raw: raw.to_string(),
    })
}

/// Enum identificado no fio por um inteiro pequeno
pub trait OrdinalEnum: Sized + Copy {
    const FIELD: &'static str;

    fn ordinal(self) -> u8;

    fn from_ordinal(code: u64) -> Option<Self>;
}

/// Decodifica um ordinal; fora do intervalo é erro
pub fn decode_ordinal<E: OrdinalEnum>(code: u64) -> Result<E, CodecError> {
    E::from_ordinal(code).ok_or_else(|| CodecError::UnknownOrdinal {
        field: E::FIELD,
        raw: code.to_string(),
    })
}

/// Implementa Serialize/Deserialize via [`TaggedEnum`]
macro_rules! tagged_enum_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::codec::TaggedEnum::tag(*self))
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                $crate::codec::decode_tag(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Implementa Serialize/Deserialize via [`OrdinalEnum`]
macro_rules! ordinal_enum_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_u8($crate::codec::OrdinalEnum::ordinal(*self))
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let code = <u64 as serde::Deserialize>::deserialize(deserializer)?;
                $crate::codec::decode_ordinal(code).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use ordinal_enum_serde;
pub(crate) use tagged_enum_serde;

/// `#[serde(with = "codec::blank_date", default)]` para `Option<NaiveDate>`
pub mod blank_date {
    use chrono::NaiveDate;
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = super::encode_date(*value).map_err(ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        super::decode_date(raw.as_deref()).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "codec::date_time")]` para `NaiveDateTime`
pub mod date_time {
    use chrono::NaiveDateTime;
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = super::encode_date_time(value).map_err(ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::decode_date_time(&raw).map_err(de::Error::custom)
    }
}

/// Variante opcional: `null`/`""` decodificam como `None`, `None` codifica como `null`
pub mod optional_date_time {
    use chrono::NaiveDateTime;
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => {
                let encoded = super::encode_date_time(value).map_err(ser::Error::custom)?;
                serializer.serialize_str(&encoded)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(text) => super::decode_date_time(text).map(Some).map_err(de::Error::custom),
        }
    }
}
