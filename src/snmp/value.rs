use std::net::Ipv4Addr;

use serde::Serialize;
use snmp2::Value;

use super::oid::OidPath;

/// Значение с провода, разрешённое один раз при декодировании.
///
/// Дальше транспорта ходят только байты или целое; нормализатор никогда
/// не видит типы snmp2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    Bytes(Vec<u8>),
    Integer(i64),
}

impl WireValue {
    pub fn text(s: &str) -> Self {
        WireValue::Bytes(s.as_bytes().to_vec())
    }

    /// Текстовое представление. Хвостовые NUL и пробелы отрезаются:
    /// некоторые прошивки дополняют ими описания расходников.
    pub fn as_text(&self) -> String {
        match self {
            WireValue::Bytes(bytes) => String::from_utf8_lossy(bytes)
                .trim_end_matches(['\0', ' ', '\r', '\n'])
                .to_string(),
            WireValue::Integer(n) => n.to_string(),
        }
    }

    /// Целое значение. Строки с числом внутри тоже принимаются,
    /// часть агентов отдаёт уровни как OCTET STRING.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            WireValue::Integer(n) => Some(*n),
            WireValue::Bytes(_) => self.as_text().trim().parse().ok(),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            WireValue::Bytes(bytes) => Some(bytes),
            WireValue::Integer(_) => None,
        }
    }
}

/// Ошибка уровня отдельного varbind (сам запрос при этом успешен).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarbindError {
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    Unsupported,
}

/// Ответ на один OID запроса.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Value(WireValue),
    Error(VarbindError),
}

impl Response {
    pub fn value(&self) -> Option<&WireValue> {
        match self {
            Response::Value(v) => Some(v),
            Response::Error(_) => None,
        }
    }

    pub fn from_snmp(value: Value<'_>) -> Self {
        match value {
            Value::Integer(n) => Response::Value(WireValue::Integer(n)),
            Value::OctetString(bytes) | Value::Opaque(bytes) => {
                Response::Value(WireValue::Bytes(bytes.to_vec()))
            }
            Value::Counter32(n) | Value::Unsigned32(n) | Value::Timeticks(n) => {
                Response::Value(WireValue::Integer(i64::from(n)))
            }
            Value::Counter64(n) => Response::Value(WireValue::Integer(i64::try_from(n).unwrap_or(i64::MAX))),
            Value::ObjectIdentifier(oid) => Response::Value(WireValue::Bytes(oid.to_string().into_bytes())),
            Value::IpAddress(octets) => {
                Response::Value(WireValue::Bytes(Ipv4Addr::from(octets).to_string().into_bytes()))
            }
            Value::NoSuchObject => Response::Error(VarbindError::NoSuchObject),
            Value::NoSuchInstance => Response::Error(VarbindError::NoSuchInstance),
            Value::EndOfMibView => Response::Error(VarbindError::EndOfMibView),
            _ => Response::Error(VarbindError::Unsupported),
        }
    }
}

/// Пара (OID, ответ).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varbind {
    pub oid: OidPath,
    pub response: Response,
}

impl Varbind {
    pub fn new(oid: OidPath, response: Response) -> Self {
        Self { oid, response }
    }
}
