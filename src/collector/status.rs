use super::types::PrinterStatus;
use crate::snmp::{Response, WireValue};

// hrPrinterDetectedErrorState, первый байт (RFC 3805)
const B0_SERVICE_REQUESTED: u8 = 0x01;
const B0_OFFLINE: u8 = 0x02;
const B0_JAMMED: u8 = 0x04;
const B0_DOOR_OPEN: u8 = 0x08;
const B0_NO_TONER: u8 = 0x10;
const B0_LOW_TONER: u8 = 0x20;
const B0_NO_PAPER: u8 = 0x40;
// второй байт
const B1_INPUT_TRAY_EMPTY: u8 = 0x04;

/// Флаги тонера, которые нужны нормализатору; в строку статуса не попадают.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TonerFlags {
    pub no_toner: bool,
    pub low_toner: bool,
}

/// Разобранное состояние ошибок устройства
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedStatus {
    pub status: PrinterStatus,
    pub flags: TonerFlags,
}

impl Default for DecodedStatus {
    fn default() -> Self {
        Self {
            status: PrinterStatus::Running,
            flags: TonerFlags::default(),
        }
    }
}

pub struct StatusDecoder;

impl StatusDecoder {
    /// Разбирает битовое поле ошибок.
    ///
    /// Отсутствие ответа, ошибка varbind или пустой буфер дают `running`:
    /// нет данных об ошибке, значит ошибки нет.
    pub fn decode(response: Option<&Response>) -> DecodedStatus {
        match response.and_then(Response::value).and_then(WireValue::as_bytes) {
            Some(bytes) => Self::decode_bytes(bytes),
            None => DecodedStatus::default(),
        }
    }

    pub fn decode_bytes(bytes: &[u8]) -> DecodedStatus {
        let Some(&b0) = bytes.first() else {
            return DecodedStatus::default();
        };

        let flags = TonerFlags {
            no_toner: b0 & B0_NO_TONER != 0,
            low_toner: b0 & B0_LOW_TONER != 0,
        };

        // Приоритет: замятие > нет бумаги > дверца > нет тонера > сервис
        let status = if b0 & B0_JAMMED != 0 {
            Some(PrinterStatus::Jammed)
        } else if b0 & B0_NO_PAPER != 0 {
            Some(PrinterStatus::NoPaper)
        } else if b0 & B0_DOOR_OPEN != 0 {
            Some(PrinterStatus::DoorOpen)
        } else if flags.no_toner {
            Some(PrinterStatus::NoToner)
        } else if b0 & (B0_SERVICE_REQUESTED | B0_OFFLINE) != 0 {
            Some(PrinterStatus::ServiceRequired)
        } else {
            None
        };

        let status = status
            .or_else(|| {
                bytes
                    .get(1)
                    .filter(|&&b1| b1 & B1_INPUT_TRAY_EMPTY != 0)
                    .map(|_| PrinterStatus::NoPaper)
            })
            .unwrap_or(PrinterStatus::Running);

        DecodedStatus { status, flags }
    }
}
