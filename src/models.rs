use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Alumno,
    Profesor,
    Superadmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Alumno => write!(f, "alumno"),
            Role::Profesor => write!(f, "profesor"),
            Role::Superadmin => write!(f, "superadmin"),
        }
    }
}

/// The signed-in user an access decision is made for.
///
/// A superadmin has global scope and never carries a module; alumnos and
/// profesores are always bound to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PrincipalRecord", into = "PrincipalRecord")]
pub struct Principal {
    id: Uuid,
    role: Role,
    modulo: Option<String>,
    cohort: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrincipalRecord {
    id: Uuid,
    role: Role,
    #[serde(default)]
    modulo: Option<String>,
    #[serde(default)]
    cohort: Option<i32>,
}

impl Principal {
    pub fn new(
        id: Uuid,
        role: Role,
        modulo: Option<String>,
        cohort: Option<i32>,
    ) -> Result<Self, CoreError> {
        match (role, modulo.as_deref()) {
            (Role::Superadmin, Some(modulo)) => {
                return Err(CoreError::InvalidPrincipal(format!(
                    "superadmin {id} cannot be scoped to module {modulo:?}"
                )));
            }
            (Role::Alumno | Role::Profesor, None) => {
                return Err(CoreError::InvalidPrincipal(format!(
                    "{role} {id} has no assigned module"
                )));
            }
            (Role::Alumno | Role::Profesor, Some(modulo)) if modulo.trim().is_empty() => {
                return Err(CoreError::InvalidPrincipal(format!(
                    "{role} {id} has an empty module"
                )));
            }
            _ => {}
        }

        Ok(Self {
            id,
            role,
            modulo,
            cohort,
        })
    }

    pub fn superadmin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Superadmin,
            modulo: None,
            cohort: None,
        }
    }

    pub fn profesor(id: Uuid, modulo: &str) -> Result<Self, CoreError> {
        Self::new(id, Role::Profesor, Some(modulo.to_string()), None)
    }

    pub fn alumno(id: Uuid, modulo: &str, cohort: Option<i32>) -> Result<Self, CoreError> {
        Self::new(id, Role::Alumno, Some(modulo.to_string()), cohort)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn modulo(&self) -> Option<&str> {
        self.modulo.as_deref()
    }

    pub fn cohort(&self) -> Option<i32> {
        self.cohort
    }
}

impl TryFrom<PrincipalRecord> for Principal {
    type Error = CoreError;

    fn try_from(record: PrincipalRecord) -> Result<Self, Self::Error> {
        Principal::new(record.id, record.role, record.modulo, record.cohort)
    }
}

impl From<Principal> for PrincipalRecord {
    fn from(principal: Principal) -> Self {
        PrincipalRecord {
            id: principal.id,
            role: principal.role,
            modulo: principal.modulo,
            cohort: principal.cohort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    Reserve,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Action::View => write!(f, "view"),
            Action::Create => write!(f, "create"),
            Action::Edit => write!(f, "edit"),
            Action::Delete => write!(f, "delete"),
            Action::Reserve => write!(f, "reserve"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id: Uuid,
    pub nombre: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub modulo: Option<String>,
    #[serde(default)]
    pub cohort: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnoEstado {
    #[default]
    Disponible,
    Solicitado,
    Aprobado,
    Rechazado,
}

impl fmt::Display for TurnoEstado {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TurnoEstado::Disponible => write!(f, "Disponible"),
            TurnoEstado::Solicitado => write!(f, "Solicitado"),
            TurnoEstado::Aprobado => write!(f, "Aprobado"),
            TurnoEstado::Rechazado => write!(f, "Rechazado"),
        }
    }
}

impl FromStr for TurnoEstado {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Disponible" => Ok(TurnoEstado::Disponible),
            "Solicitado" => Ok(TurnoEstado::Solicitado),
            "Aprobado" => Ok(TurnoEstado::Aprobado),
            "Rechazado" => Ok(TurnoEstado::Rechazado),
            _ => Err(CoreError::validation("estado", value, "unknown turno status")),
        }
    }
}

/// Server-side state of a review slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnoRecord {
    pub id: Option<Uuid>,
    pub titulo: Option<String>,
    pub modulo: Option<String>,
    pub descripcion: Option<String>,
    pub review: Option<i64>,
    pub fecha: Option<NaiveDate>,
    pub horario: Option<String>,
    pub sala: Option<i64>,
    pub zoom_link: Option<String>,
    pub comentarios: Option<String>,
    pub estado: Option<TurnoEstado>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    #[default]
    #[serde(rename = "A revisar")]
    ARevisar,
    Aprobado,
    Desaprobado,
}

impl ReviewStatus {
    /// Reviewed entregas are frozen for their author.
    pub fn is_terminal(self) -> bool {
        matches!(self, ReviewStatus::Aprobado | ReviewStatus::Desaprobado)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReviewStatus::ARevisar => write!(f, "A revisar"),
            ReviewStatus::Aprobado => write!(f, "Aprobado"),
            ReviewStatus::Desaprobado => write!(f, "Desaprobado"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entrega {
    pub id: Uuid,
    pub alumno_id: Uuid,
    #[serde(default)]
    pub modulo: Option<String>,
    #[serde(default)]
    pub sprint: Option<i32>,
    #[serde(default)]
    pub github_link: Option<String>,
    #[serde(default)]
    pub render_link: Option<String>,
    #[serde(default)]
    pub comentarios: Option<String>,
    #[serde(default)]
    pub review_status: ReviewStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Usuario,
    Turno,
    Entrega,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceKind::Usuario => write!(f, "usuario"),
            ResourceKind::Turno => write!(f, "turno"),
            ResourceKind::Entrega => write!(f, "entrega"),
        }
    }
}

/// An owned resource of any kind, as read from a fixture file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resource {
    Usuario(Usuario),
    Turno(TurnoRecord),
    Entrega(Entrega),
}

/// Borrowed view of a resource handed to the access evaluator.
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'a> {
    Usuario(&'a Usuario),
    Turno(&'a TurnoRecord),
    Entrega(&'a Entrega),
}

impl<'a> ResourceRef<'a> {
    pub fn kind(self) -> ResourceKind {
        match self {
            ResourceRef::Usuario(_) => ResourceKind::Usuario,
            ResourceRef::Turno(_) => ResourceKind::Turno,
            ResourceRef::Entrega(_) => ResourceKind::Entrega,
        }
    }

    pub fn modulo(self) -> Option<&'a str> {
        match self {
            ResourceRef::Usuario(usuario) => usuario.modulo.as_deref(),
            ResourceRef::Turno(turno) => turno.modulo.as_deref(),
            ResourceRef::Entrega(entrega) => entrega.modulo.as_deref(),
        }
    }
}

pub trait AsResource {
    fn as_resource(&self) -> ResourceRef<'_>;
}

impl AsResource for Usuario {
    fn as_resource(&self) -> ResourceRef<'_> {
        ResourceRef::Usuario(self)
    }
}

impl AsResource for TurnoRecord {
    fn as_resource(&self) -> ResourceRef<'_> {
        ResourceRef::Turno(self)
    }
}

impl AsResource for Entrega {
    fn as_resource(&self) -> ResourceRef<'_> {
        ResourceRef::Entrega(self)
    }
}

impl AsResource for Resource {
    fn as_resource(&self) -> ResourceRef<'_> {
        match self {
            Resource::Usuario(usuario) => ResourceRef::Usuario(usuario),
            Resource::Turno(turno) => ResourceRef::Turno(turno),
            Resource::Entrega(entrega) => ResourceRef::Entrega(entrega),
        }
    }
}

/// Form state for a turno. Every value is kept as typed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EditDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora_inicio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora_fin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sala: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comentarios: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub label: String,
    pub count: usize,
}
