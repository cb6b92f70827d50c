//! Envelope de resposta com nome de propriedade dinâmico
//!
//! Várias listagens da Kaonavi devolvem `{"<nome>": [...]}` onde o nome
//! (`department_data`, `user_data`, `sheets`, ...) muda por endpoint.
//! [`ApiEnvelope`] descobre a propriedade que carrega o array e guarda o nome.
//!
//! Regras:
//! - a raiz precisa ser um objeto
//! - a primeira propriedade cujo valor é array (na ordem do documento) vence
//! - propriedades irmãs que não são array são ignoradas
//! - sem nenhuma propriedade array, ou com elemento inválido, o decode falha

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{KaonaviError, Result};

/// Payload de uma listagem: nome descoberto + itens
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEnvelope<T> {
    pub name: String,
    pub items: Vec<T>,
}

impl<T> ApiEnvelope<T> {
    /// Garante que o nome descoberto é o esperado pelo chamador
    pub fn expect_name(self, expected: &str) -> Result<Self> {
        if self.name == expected {
            Ok(self)
        } else {
            Err(KaonaviError::malformed(
                format!("expected envelope property `{expected}`, found `{}`", self.name),
                self.name,
            ))
        }
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ApiEnvelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(EnvelopeVisitor(PhantomData))
    }
}

struct EnvelopeVisitor<T>(PhantomData<T>);

impl<'de, T: DeserializeOwned> Visitor<'de> for EnvelopeVisitor<T> {
    type Value = ApiEnvelope<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object with one array-valued property")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut found: Option<(String, Vec<Value>)> = None;

        while let Some(key) = map.next_key::<String>()? {
            if found.is_some() {
                map.next_value::<IgnoredAny>()?;
                continue;
            }
            if let Value::Array(elements) = map.next_value::<Value>()? {
                found = Some((key, elements));
            }
        }

        let (name, elements) =
            found.ok_or_else(|| <A::Error as de::Error>::custom("no array-valued property in envelope"))?;

        let items = elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                serde_path_to_error::deserialize(element).map_err(|e| {
                    <A::Error as de::Error>::custom(if e.path().iter().next().is_none() {
                        format!("`{name}`[{index}]: {}", e.inner())
                    } else {
                        format!("`{name}`[{index}].{}: {}", e.path(), e.inner())
                    })
                })
            })
            .collect::<std::result::Result<Vec<T>, A::Error>>()?;

        Ok(ApiEnvelope { name, items })
    }
}

/// Decodifica um envelope a partir do corpo bruto
///
/// Falhas viram `MalformedResponse` com o fragmento bruto.
pub fn decode_envelope<T: DeserializeOwned>(raw: &str, expected: Option<&str>) -> Result<ApiEnvelope<T>> {
    let envelope: ApiEnvelope<T> = decode_document(raw, "envelope")?;

    match expected {
        Some(name) => envelope.expect_name(name),
        None => Ok(envelope),
    }
}

/// Decodifica um documento JSON completo
///
/// O erro leva o caminho do campo que falhou (`member_data[0].retired_date`)
/// além da mensagem do codec.
pub(crate) fn decode_document<T: DeserializeOwned>(raw: &str, context: &str) -> Result<T> {
    let malformed = |detail: String| KaonaviError::malformed(format!("{context}: {detail}"), truncate(raw));

    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let value: T = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        if e.path().iter().next().is_none() {
            malformed(e.inner().to_string())
        } else {
            malformed(format!("{}: {}", e.path(), e.inner()))
        }
    })?;
    deserializer.end().map_err(|e| malformed(e.to_string()))?;

    Ok(value)
}

const RAW_FRAGMENT_LIMIT: usize = 512;

/// Recorta o corpo bruto para caber na mensagem de erro (respeitando UTF-8)
pub(crate) fn truncate(raw: &str) -> String {
    if raw.len() <= RAW_FRAGMENT_LIMIT {
        return raw.to_string();
    }
    let mut end = RAW_FRAGMENT_LIMIT;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw[..end])
}
