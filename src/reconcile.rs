use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::error::CoreError;
use crate::models::{EditDraft, TurnoEstado, TurnoRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const HORARIO_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnoField {
    Titulo,
    Modulo,
    Descripcion,
    Review,
    Fecha,
    Horario,
    Sala,
    ZoomLink,
    Comentarios,
    Estado,
}

impl TurnoField {
    pub fn name(self) -> &'static str {
        match self {
            TurnoField::Titulo => "titulo",
            TurnoField::Modulo => "modulo",
            TurnoField::Descripcion => "descripcion",
            TurnoField::Review => "review",
            TurnoField::Fecha => "fecha",
            TurnoField::Horario => "horario",
            TurnoField::Sala => "sala",
            TurnoField::ZoomLink => "zoomLink",
            TurnoField::Comentarios => "comentarios",
            TurnoField::Estado => "estado",
        }
    }

    pub fn is_academic(self) -> bool {
        matches!(
            self,
            TurnoField::Titulo | TurnoField::Modulo | TurnoField::Descripcion
        )
    }
}

/// How a field's candidate value is read out of the draft.
#[derive(Debug, Clone, Copy)]
enum Source {
    Text,
    Trimmed,
    Integer,
    Date,
    TimeRange,
    Estado,
}

#[derive(Debug, Clone, Copy)]
enum Editable {
    Always,
    OnCreate,
}

/// What to send when the draft leaves a field blank.
#[derive(Debug, Clone, Copy)]
enum EmptyPolicy {
    KeepExisting,
    KeepExistingOr(&'static str),
}

#[derive(Debug, Clone, Copy)]
enum WireName {
    Fixed(&'static str),
    Sala,
}

/// Which API routes accept the field.
#[derive(Debug, Clone, Copy)]
enum Routes {
    CreateAndEdit,
    CreateOnly,
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    field: TurnoField,
    source: Source,
    editable: Editable,
    empty_policy: EmptyPolicy,
    wire_name: WireName,
    routes: Routes,
}

const fn field_spec(
    field: TurnoField,
    source: Source,
    editable: Editable,
    empty_policy: EmptyPolicy,
    wire_name: WireName,
    routes: Routes,
) -> FieldSpec {
    FieldSpec {
        field,
        source,
        editable,
        empty_policy,
        wire_name,
        routes,
    }
}

use EmptyPolicy::{KeepExisting, KeepExistingOr};
use Routes::{CreateAndEdit, CreateOnly};

#[rustfmt::skip]
const FIELD_TABLE: [FieldSpec; 10] = [
    field_spec(TurnoField::Titulo, Source::Text, Editable::OnCreate, KeepExisting, WireName::Fixed("titulo"), CreateAndEdit),
    field_spec(TurnoField::Modulo, Source::Text, Editable::OnCreate, KeepExisting, WireName::Fixed("modulo"), CreateAndEdit),
    field_spec(TurnoField::Descripcion, Source::Text, Editable::OnCreate, KeepExisting, WireName::Fixed("descripcion"), CreateAndEdit),
    field_spec(TurnoField::Review, Source::Integer, Editable::Always, KeepExisting, WireName::Fixed("review"), CreateAndEdit),
    field_spec(TurnoField::Fecha, Source::Date, Editable::Always, KeepExisting, WireName::Fixed("fecha"), CreateAndEdit),
    field_spec(TurnoField::Horario, Source::TimeRange, Editable::Always, KeepExisting, WireName::Fixed("horario"), CreateAndEdit),
    field_spec(TurnoField::Sala, Source::Integer, Editable::Always, KeepExisting, WireName::Sala, CreateAndEdit),
    field_spec(TurnoField::ZoomLink, Source::Text, Editable::Always, KeepExisting, WireName::Fixed("zoomLink"), CreateAndEdit),
    field_spec(TurnoField::Comentarios, Source::Trimmed, Editable::Always, KeepExisting, WireName::Fixed("comentarios"), CreateAndEdit),
    field_spec(TurnoField::Estado, Source::Estado, Editable::Always, KeepExistingOr("Disponible"), WireName::Fixed("estado"), CreateOnly),
];

impl Editable {
    fn allows(self, is_creating: bool) -> bool {
        match self {
            Editable::Always => true,
            Editable::OnCreate => is_creating,
        }
    }
}

impl Routes {
    fn accepts(self, is_creating: bool) -> bool {
        match self {
            Routes::CreateAndEdit => true,
            Routes::CreateOnly => is_creating,
        }
    }
}

impl EmptyPolicy {
    fn default_value(self) -> Option<Value> {
        match self {
            EmptyPolicy::KeepExisting => None,
            EmptyPolicy::KeepExistingOr(value) => Some(Value::String(value.to_string())),
        }
    }
}

impl WireName {
    fn resolve(self, options: &ReconcileOptions) -> &str {
        match self {
            WireName::Fixed(name) => name,
            WireName::Sala => &options.sala_wire_name,
        }
    }
}

/// Settings that depend on the API contract rather than on the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Wire name of the room number. The API has answered to `sala`, `room`
    /// and `roomNumber` at different times.
    pub sala_wire_name: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            sala_wire_name: "sala".to_string(),
        }
    }
}

/// Request body for `POST /turnos` or `PATCH /turnos/:id`, keyed by wire name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WirePayload(Map<String, Value>);

impl WirePayload {
    pub fn get(&self, wire_name: &str) -> Option<&Value> {
        self.0.get(wire_name)
    }

    pub fn contains_key(&self, wire_name: &str) -> bool {
        self.0.contains_key(wire_name)
    }

    pub fn as_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Reads the payload back into form state, e.g. to reopen a submitted edit.
    pub fn to_draft(&self, options: &ReconcileOptions) -> EditDraft {
        let text = |field: TurnoField| {
            let name = wire_name_of(field, options);
            self.0.get(name).and_then(value_to_text)
        };

        let (hora_inicio, hora_fin) = match text(TurnoField::Horario) {
            Some(horario) => split_horario(&horario),
            None => (None, None),
        };

        EditDraft {
            titulo: text(TurnoField::Titulo),
            modulo: text(TurnoField::Modulo),
            descripcion: text(TurnoField::Descripcion),
            review: text(TurnoField::Review),
            fecha: text(TurnoField::Fecha),
            hora_inicio,
            hora_fin,
            sala: text(TurnoField::Sala),
            zoom_link: text(TurnoField::ZoomLink),
            comentarios: text(TurnoField::Comentarios),
            estado: text(TurnoField::Estado),
        }
    }
}

impl EditDraft {
    /// Populates a form from the turno as last fetched from the server.
    pub fn from_record(record: &TurnoRecord) -> Self {
        let (hora_inicio, hora_fin) = match record.horario.as_deref() {
            Some(horario) => split_horario(horario),
            None => (None, None),
        };

        EditDraft {
            titulo: record.titulo.clone(),
            modulo: record.modulo.clone(),
            descripcion: record.descripcion.clone(),
            review: record.review.map(|review| review.to_string()),
            fecha: record.fecha.map(|fecha| fecha.format(DATE_FORMAT).to_string()),
            hora_inicio,
            hora_fin,
            sala: record.sala.map(|sala| sala.to_string()),
            zoom_link: record.zoom_link.clone(),
            comentarios: record.comentarios.clone(),
            estado: record.estado.map(|estado| estado.to_string()),
        }
    }
}

/// Builds the request body for a turno from the user's draft.
///
/// Blank draft values never overwrite what the server already holds: they
/// fall back to `existing`, and whatever is still blank is left out. When
/// editing, `titulo`, `modulo` and `descripcion` are taken from `existing`
/// only. For a new turno pass `TurnoRecord::default()` as `existing`.
///
/// Non-numeric `review`/`sala`, malformed dates or times, and an end time not
/// after the start time are rejected with [`CoreError::Validation`].
pub fn reconcile(
    existing: &TurnoRecord,
    edited: &EditDraft,
    is_creating: bool,
    options: &ReconcileOptions,
) -> Result<WirePayload, CoreError> {
    let mut payload = Map::new();

    for spec in FIELD_TABLE.iter() {
        if !spec.routes.accepts(is_creating) {
            continue;
        }

        let candidate = if spec.editable.allows(is_creating) {
            candidate_value(spec, edited)?
        } else {
            None
        };

        let value = match candidate {
            Some(value) => Some(value),
            None => {
                let fallback = existing_value(existing, spec.field);
                if fallback.is_some() {
                    debug!(field = spec.field.name(), "keeping existing value");
                }
                fallback.or_else(|| spec.empty_policy.default_value())
            }
        };

        match value {
            Some(value) if !is_blank(&value) => {
                payload.insert(spec.wire_name.resolve(options).to_string(), value);
            }
            _ => {}
        }
    }

    let payload = WirePayload(payload);
    check_academic_fields(&payload, options)?;
    Ok(payload)
}

fn candidate_value(spec: &FieldSpec, draft: &EditDraft) -> Result<Option<Value>, CoreError> {
    let field = spec.field.name();
    let value = match spec.source {
        Source::Text => draft_text(draft, spec.field)
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| Value::String(raw.to_string())),
        Source::Trimmed => {
            non_blank(draft_text(draft, spec.field)).map(|trimmed| Value::String(trimmed.to_string()))
        }
        Source::Integer => match non_blank(draft_text(draft, spec.field)) {
            Some(raw) => {
                let number = raw
                    .bytes()
                    .all(|b| b.is_ascii_digit())
                    .then(|| raw.parse::<i64>().ok())
                    .flatten()
                    .ok_or_else(|| {
                        warn!(field, value = raw, "rejected non-numeric draft value");
                        CoreError::validation(field, raw, "expected a non-negative whole number")
                    })?;
                Some(Value::from(number))
            }
            None => None,
        },
        Source::Date => match non_blank(draft_text(draft, spec.field)) {
            Some(raw) => {
                let fecha = NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map_err(|_| CoreError::validation(field, raw, "expected a YYYY-MM-DD date"))?;
                Some(Value::String(fecha.format(DATE_FORMAT).to_string()))
            }
            None => None,
        },
        Source::TimeRange => horario(draft)?.map(Value::String),
        Source::Estado => match non_blank(draft_text(draft, spec.field)) {
            Some(raw) => Some(Value::String(raw.parse::<TurnoEstado>()?.to_string())),
            None => None,
        },
    };
    Ok(value)
}

fn horario(draft: &EditDraft) -> Result<Option<String>, CoreError> {
    let start = non_blank(draft.hora_inicio.as_deref());
    let end = non_blank(draft.hora_fin.as_deref());

    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => {
            let start_time = parse_time("horaInicio", start)?;
            let end_time = parse_time("horaFin", end)?;
            if end_time <= start_time {
                return Err(CoreError::validation(
                    "horaFin",
                    end,
                    "end time must be after start time",
                ));
            }
            Ok(Some(format_horario(start_time, end_time)))
        }
        (Some(_), None) => Err(CoreError::validation("horaFin", "", "end time is required")),
        (None, Some(_)) => Err(CoreError::validation(
            "horaInicio",
            "",
            "start time is required",
        )),
    }
}

fn parse_time(field: &'static str, raw: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|_| CoreError::validation(field, raw, "expected an HH:MM time"))
}

fn draft_text(draft: &EditDraft, field: TurnoField) -> Option<&str> {
    match field {
        TurnoField::Titulo => draft.titulo.as_deref(),
        TurnoField::Modulo => draft.modulo.as_deref(),
        TurnoField::Descripcion => draft.descripcion.as_deref(),
        TurnoField::Review => draft.review.as_deref(),
        TurnoField::Fecha => draft.fecha.as_deref(),
        TurnoField::Horario => None,
        TurnoField::Sala => draft.sala.as_deref(),
        TurnoField::ZoomLink => draft.zoom_link.as_deref(),
        TurnoField::Comentarios => draft.comentarios.as_deref(),
        TurnoField::Estado => draft.estado.as_deref(),
    }
}

fn existing_value(existing: &TurnoRecord, field: TurnoField) -> Option<Value> {
    let text = |value: &Option<String>| value.clone().map(Value::String);
    match field {
        TurnoField::Titulo => text(&existing.titulo),
        TurnoField::Modulo => text(&existing.modulo),
        TurnoField::Descripcion => text(&existing.descripcion),
        TurnoField::Review => existing.review.filter(|review| *review >= 0).map(Value::from),
        TurnoField::Fecha => existing
            .fecha
            .map(|fecha| Value::String(fecha.format(DATE_FORMAT).to_string())),
        TurnoField::Horario => existing.horario.as_deref().map(|horario| {
            let canonical = match parse_horario(horario) {
                Some((start, end)) => format_horario(start, end),
                None => horario.to_string(),
            };
            Value::String(canonical)
        }),
        TurnoField::Sala => existing.sala.filter(|sala| *sala >= 0).map(Value::from),
        TurnoField::ZoomLink => text(&existing.zoom_link),
        TurnoField::Comentarios => existing
            .comentarios
            .as_deref()
            .map(|comentarios| Value::String(comentarios.trim().to_string())),
        TurnoField::Estado => existing.estado.map(|estado| Value::String(estado.to_string())),
    }
}

fn check_academic_fields(
    payload: &WirePayload,
    options: &ReconcileOptions,
) -> Result<(), CoreError> {
    for spec in FIELD_TABLE.iter().filter(|spec| spec.field.is_academic()) {
        if let Some(value) = payload.get(spec.wire_name.resolve(options)) {
            if is_blank(value) {
                error!(field = spec.field.name(), "academic field left blank after cleanup");
                return Err(CoreError::ReconciliationInvariant {
                    field: spec.field.name(),
                });
            }
        }
    }
    Ok(())
}

fn wire_name_of(field: TurnoField, options: &ReconcileOptions) -> &str {
    FIELD_TABLE
        .iter()
        .find(|spec| spec.field == field)
        .map_or(field.name(), |spec| spec.wire_name.resolve(options))
}

/// Form values for a stored horario. Anything that is not a valid
/// `HH:MM - HH:MM` window leaves both inputs empty, so an untouched form keeps
/// the stored value as it is.
fn split_horario(horario: &str) -> (Option<String>, Option<String>) {
    match parse_horario(horario) {
        Some((start, end)) => (
            Some(start.format(TIME_FORMAT).to_string()),
            Some(end.format(TIME_FORMAT).to_string()),
        ),
        None => (None, None),
    }
}

fn parse_horario(horario: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (start, end) = horario.split_once(HORARIO_SEPARATOR)?;
    let start = NaiveTime::parse_from_str(start.trim(), TIME_FORMAT).ok()?;
    let end = NaiveTime::parse_from_str(end.trim(), TIME_FORMAT).ok()?;
    (end > start).then_some((start, end))
}

fn format_horario(start: NaiveTime, end: NaiveTime) -> String {
    format!(
        "{}{}{}",
        start.format(TIME_FORMAT),
        HORARIO_SEPARATOR,
        end.format(TIME_FORMAT)
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
