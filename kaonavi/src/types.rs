//! Estruturas de dados da API Kaonavi v2
//!
//! DTOs planos usados pelos módulos de operação. Datas passam pelos codecs de
//! [`crate::codec`]; campos que só existem na resposta (`age`,
//! `years_of_service`, nomes de custom fields) não são enviados de volta.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::codec::{self, ordinal_enum_serde, tagged_enum_serde, OrdinalEnum, TaggedEnum};

// ============================================================================
// Tasks
// ============================================================================

/// Identificador de task assíncrona devolvido pelas operações de escrita
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resposta das operações que enfileiram uma task (`{"task_id": 1}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAccepted {
    pub task_id: TaskId,
}

/// Status de uma task no fio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Concluída com sucesso
    Ok,
    /// Concluída com erro de validação
    Ng,
    /// Erro interno do serviço
    Error,
    /// Na fila
    Waiting,
    /// Em execução
    Running,
}

impl TaggedEnum for TaskStatus {
    const FIELD: &'static str = "status";

    fn tag(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Ng => "NG",
            Self::Error => "ERROR",
            Self::Waiting => "WAITING",
            Self::Running => "RUNNING",
        }
    }

    fn from_tag(raw: &str) -> Option<Self> {
        match raw {
            "OK" => Some(Self::Ok),
            "NG" => Some(Self::Ng),
            "ERROR" => Some(Self::Error),
            "WAITING" => Some(Self::Waiting),
            "RUNNING" => Some(Self::Running),
            _ => None,
        }
    }
}

tagged_enum_serde!(TaskStatus);

impl TaskStatus {
    /// `true` para OK, NG e ERROR
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ok | Self::Ng | Self::Error)
    }
}

/// Progresso de uma task (`GET /tasks/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskProgress {
    pub id: TaskId,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub messages: Vec<String>,
}

// O serviço manda `"messages": null` enquanto a task não terminou
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Layouts
// ============================================================================

/// Tipo de um campo de layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Number,
    Date,
    Enum,
    /// Departamento principal do membro
    Department,
    /// Departamentos de acúmulo (`department[]`)
    DepartmentList,
}

impl TaggedEnum for FieldType {
    const FIELD: &'static str = "type";

    fn tag(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Enum => "enum",
            Self::Department => "department",
            Self::DepartmentList => "department[]",
        }
    }

    fn from_tag(raw: &str) -> Option<Self> {
        match raw {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "enum" => Some(Self::Enum),
            "department" => Some(Self::Department),
            "department[]" => Some(Self::DepartmentList),
            _ => None,
        }
    }
}

tagged_enum_serde!(FieldType);

/// Tipo de registro de uma sheet: ordinal no fio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Um registro por membro (0)
    Single,
    /// Vários registros por membro (1)
    Multiple,
}

impl OrdinalEnum for RecordType {
    const FIELD: &'static str = "record_type";

    fn ordinal(self) -> u8 {
        match self {
            Self::Single => 0,
            Self::Multiple => 1,
        }
    }

    fn from_ordinal(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Single),
            1 => Some(Self::Multiple),
            _ => None,
        }
    }
}

ordinal_enum_serde!(RecordType);

/// Definição de um campo fixo do layout de membros
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(rename = "enum", default)]
    pub options: Vec<String>,
}

/// Definição de um custom field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldLayout {
    pub id: u64,
    pub name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(rename = "enum", default)]
    pub options: Vec<String>,
}

/// Layout do cadastro básico de membros (`GET /member_layouts`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberLayout {
    pub code: FieldLayout,
    pub name: FieldLayout,
    pub name_kana: FieldLayout,
    pub mail: FieldLayout,
    pub entered_date: FieldLayout,
    pub retired_date: FieldLayout,
    pub gender: FieldLayout,
    pub birthday: FieldLayout,
    pub department: FieldLayout,
    pub sub_departments: FieldLayout,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldLayout>,
}

/// Layout de uma sheet (`GET /sheet_layouts`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub id: u64,
    pub name: String,
    pub record_type: RecordType,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldLayout>,
}

// ============================================================================
// Membros e sheets
// ============================================================================

/// Valor de um custom field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    pub id: u64,
    #[serde(default, skip_serializing)]
    pub name: Option<String>,
    pub values: Vec<String>,
}

impl CustomFieldValue {
    pub fn new(id: u64, values: Vec<String>) -> Self {
        Self {
            id,
            name: None,
            values,
        }
    }
}

/// Referência a um departamento dentro do cadastro de um membro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDepartment {
    pub code: String,
    #[serde(default, skip_serializing)]
    pub name: Option<String>,
    #[serde(default, skip_serializing)]
    pub names: Vec<String>,
}

/// Cadastro básico de um membro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberData {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_kana: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(with = "codec::blank_date", default)]
    pub entered_date: Option<NaiveDate>,
    #[serde(with = "codec::blank_date", default)]
    pub retired_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(with = "codec::blank_date", default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default, skip_serializing)]
    pub age: Option<u32>,
    #[serde(default, skip_serializing)]
    pub years_of_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<MemberDepartment>,
    #[serde(default)]
    pub sub_departments: Vec<MemberDepartment>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
}

impl MemberData {
    /// Membro vazio, só com o código (base para PATCH parcial)
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            name_kana: None,
            mail: None,
            entered_date: None,
            retired_date: None,
            gender: None,
            birthday: None,
            age: None,
            years_of_service: None,
            department: None,
            sub_departments: Vec::new(),
            custom_fields: Vec::new(),
        }
    }
}

/// Resposta de `GET /members`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberList {
    #[serde(with = "codec::date_time")]
    pub updated_at: NaiveDateTime,
    pub member_data: Vec<MemberData>,
}

/// Um registro de sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRecord {
    pub custom_fields: Vec<CustomFieldValue>,
}

/// Registros de sheet de um membro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetData {
    pub code: String,
    pub records: Vec<SheetRecord>,
}

/// Resposta de `GET /sheets/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDataList {
    pub id: u64,
    #[serde(with = "codec::date_time")]
    pub updated_at: NaiveDateTime,
    pub member_data: Vec<SheetData>,
}

// ============================================================================
// Departamentos, usuários e roles
// ============================================================================

/// Nó da árvore de departamentos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentTree {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent_code: Option<String>,
    #[serde(default)]
    pub leader_member_code: Option<String>,
    pub order: i32,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Role de usuário
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub role_type: String,
}

/// Usuário de login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub member_code: Option<String>,
    pub role: Role,
    #[serde(with = "codec::optional_date_time", default)]
    pub last_login_at: Option<NaiveDateTime>,
}

/// Referência a uma role no corpo de escrita de usuário
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRef {
    pub id: u64,
}

/// Corpo de `POST /users` e `PATCH /users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_code: Option<String>,
    pub role: RoleRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;

    #[test]
    fn test_task_status_tags_round_trip_exactly() {
        for status in [
            TaskStatus::Ok,
            TaskStatus::Ng,
            TaskStatus::Error,
            TaskStatus::Waiting,
            TaskStatus::Running,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: TaskStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
            assert_eq!(serde_json::to_string(&back).unwrap(), json);
        }
    }

    #[test]
    fn test_task_status_is_case_sensitive() {
        assert!(serde_json::from_str::<TaskStatus>(r#""ok""#).is_err());
        assert_eq!(
            codec::decode_tag::<TaskStatus>("Running").unwrap_err(),
            CodecError::UnknownTag {
                field: "status",
                raw: "Running".to_string()
            }
        );
    }

    #[test]
    fn test_task_progress_null_messages() {
        let progress: TaskProgress =
            serde_json::from_str(r#"{"id":3,"status":"RUNNING","messages":null}"#).unwrap();
        assert_eq!(progress.id, TaskId(3));
        assert!(!progress.status.is_terminal());
        assert!(progress.messages.is_empty());
    }

    #[test]
    fn test_record_type_ordinals() {
        let layout: SheetLayout = serde_json::from_str(
            r#"{"id":12,"name":"住所・連絡先","record_type":1,"custom_fields":[]}"#,
        )
        .unwrap();
        assert_eq!(layout.record_type, RecordType::Multiple);
        assert_eq!(serde_json::to_value(RecordType::Single).unwrap(), 0);

        assert_eq!(
            codec::decode_ordinal::<RecordType>(2).unwrap_err(),
            CodecError::UnknownOrdinal {
                field: "record_type",
                raw: "2".to_string()
            }
        );
        assert!(serde_json::from_str::<RecordType>("-1").is_err());
    }

    #[test]
    fn test_member_data_dates_and_response_only_fields() {
        let member: MemberData = serde_json::from_str(
            r#"{
                "code": "A0002",
                "name": "カオナビ 太郎",
                "entered_date": "2005-09-20",
                "retired_date": "",
                "birthday": null,
                "age": 36,
                "years_of_service": "15年5ヵ月",
                "department": {"code": "1000", "name": "取締役会", "names": ["取締役会"]},
                "sub_departments": [],
                "custom_fields": [{"id": 100, "name": "血液型", "values": ["A"]}]
            }"#,
        )
        .unwrap();

        assert_eq!(member.entered_date, NaiveDate::from_ymd_opt(2005, 9, 20));
        assert_eq!(member.retired_date, None);
        assert_eq!(member.birthday, None);
        assert_eq!(member.age, Some(36));

        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["entered_date"], "2005-09-20");
        assert_eq!(json["retired_date"], "");
        assert_eq!(json["birthday"], "");
        assert!(json.get("age").is_none());
        assert!(json.get("years_of_service").is_none());
        assert_eq!(json["department"], serde_json::json!({"code": "1000"}));
        assert_eq!(
            json["custom_fields"],
            serde_json::json!([{"id": 100, "values": ["A"]}])
        );
    }

    #[test]
    fn test_member_list_rejects_bad_updated_at() {
        let err = serde_json::from_str::<MemberList>(
            r#"{"updated_at":"2020-10-01T01:23:45Z","member_data":[]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("2020-10-01T01:23:45Z"));
    }

    #[test]
    fn test_field_type_unknown_tag_fails() {
        let err = serde_json::from_str::<FieldLayout>(
            r#"{"name":"社員番号","required":true,"type":"text","max_length":50,"enum":[]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown tag `text`"));
    }

    #[test]
    fn test_user_last_login_optional() {
        let user: User = serde_json::from_str(
            r#"{"id":1,"email":"taro@example.com","member_code":"A0002",
                "role":{"id":1,"name":"システム管理者","type":"Adm"},"last_login_at":null}"#,
        )
        .unwrap();
        assert_eq!(user.last_login_at, None);

        let user: User = serde_json::from_str(
            r#"{"id":2,"email":"hanako@example.com","member_code":null,
                "role":{"id":2,"name":"一般","type":"一般"},"last_login_at":"2021-11-01 12:00:00"}"#,
        )
        .unwrap();
        assert_eq!(
            user.last_login_at.map(|t| codec::encode_date_time(&t).unwrap()).as_deref(),
            Some("2021-11-01 12:00:00")
        );
    }
}
