//! User-facing message texts.
//!
//! Single supported language (Russian). Wording follows the original bot
//! so the conversation feels unchanged to the end user.

use crate::error::InputError;
use crate::reading::{Field, Reading, Slot};
use crate::thresholds::Classification;

fn slot_adjective(slot: Slot) -> &'static str {
    match slot {
        Slot::Morning => "Утреннее",
        Slot::Evening => "Вечернее",
    }
}

fn slot_command(slot: Slot) -> &'static str {
    match slot {
        Slot::Morning => "/morning",
        Slot::Evening => "/evening",
    }
}

/// Prompt for one of the six fields.
pub fn field_prompt(field: Field) -> String {
    let arm = match field {
        Field::LeftSystolic | Field::LeftDiastolic | Field::LeftPulse => "ЛЕВАЯ",
        Field::RightSystolic | Field::RightDiastolic | Field::RightPulse => "ПРАВАЯ",
    };
    let what = match field {
        Field::LeftSystolic | Field::RightSystolic => "ВЕРХНЕЕ давление",
        Field::LeftDiastolic | Field::RightDiastolic => "НИЖНЕЕ давление",
        Field::LeftPulse | Field::RightPulse => "ПУЛЬС",
    };
    format!("{arm} рука\nВведите {what}:")
}

/// Opening prompt when a session starts.
pub fn start_prompt(slot: Slot) -> String {
    let header = match slot {
        Slot::Morning => "🌅 Утреннее измерение",
        Slot::Evening => "🌙 Вечернее измерение",
    };
    format!("{header}\n\n{}", field_prompt(Field::first()))
}

/// Re-prompt after rejected input. The session has not advanced.
pub fn input_error(err: &InputError) -> String {
    match err {
        InputError::NotANumber(_) => "Пожалуйста, введите число:".to_string(),
        InputError::OutOfRange {
            field, min, max, ..
        } => format!(
            "Значение вне допустимого диапазона ({min}-{max}).\n{}",
            field_prompt(*field)
        ),
        InputError::Closed => no_active_session().to_string(),
    }
}

pub fn verdict(classification: Classification) -> &'static str {
    match classification {
        Classification::Optimal => "отличное",
        Classification::Normal => "нормальное",
        Classification::Elevated => "повышенное",
    }
}

/// Summary sent once all six values are collected.
pub fn completion_summary(reading: &Reading, left: Classification, right: Classification) -> String {
    format!(
        "✅ {} измерение сохранено!\n\nДата: {}\nЛевая рука: {}/{}, пульс {} ({})\nПравая рука: {}/{}, пульс {} ({})",
        slot_adjective(reading.slot),
        reading.day.format("%d.%m.%Y"),
        reading.left.systolic,
        reading.left.diastolic,
        reading.left.pulse,
        verdict(left),
        reading.right.systolic,
        reading.right.diastolic,
        reading.right.pulse,
        verdict(right),
    )
}

/// Appended to the summary when the archive write failed and the reading
/// was queued for retry.
pub fn pending_archive_notice() -> &'static str {
    "⚠️ Таблица сейчас недоступна. Данные не потеряны и будут записаны автоматически."
}

pub fn cancelled() -> &'static str {
    "Измерение отменено. Используйте /morning или /evening для нового измерения."
}

pub fn already_measured(slot: Slot) -> String {
    format!(
        "{} измерение на сегодня уже записано.",
        slot_adjective(slot)
    )
}

pub fn session_in_progress() -> &'static str {
    "Сначала завершите текущее измерение или отправьте /cancel."
}

pub fn no_active_session() -> &'static str {
    "Нет активного измерения. Используйте /morning или /evening."
}

/// Sent when a session cannot start because the archive check failed.
pub fn archive_unreachable() -> &'static str {
    "Не удалось проверить таблицу. Попробуйте ещё раз через минуту."
}

/// Base reminder at the configured slot time.
pub fn reminder(slot: Slot) -> String {
    let greeting = match slot {
        Slot::Morning => "🌅 Доброе утро!",
        Slot::Evening => "🌙 Добрый вечер!",
    };
    format!(
        "{greeting}\n\nПора измерить давление.\nИспользуйте команду {}",
        slot_command(slot)
    )
}

/// Follow-up reminder at +30 and +60 minutes.
pub fn escalation_reminder(slot: Slot) -> String {
    format!(
        "⏰ Напоминание!\n\nДавление ещё не измерено.\nИспользуйте команду {}",
        slot_command(slot)
    )
}
