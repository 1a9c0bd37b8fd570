use tracing::debug;

use crate::error::CoreError;
use crate::models::{Action, AsResource, Principal, ResourceRef, Role};

/// Decides whether `principal` may perform `action` on `resource`.
///
/// Module labels are compared verbatim. Callers normalize them through the
/// module dictionary before asking; a resource without a module never matches.
pub fn can_access(principal: &Principal, resource: ResourceRef<'_>, action: Action) -> bool {
    match principal.role() {
        Role::Superadmin => true,
        Role::Profesor => match (resource, action) {
            (
                ResourceRef::Turno(_) | ResourceRef::Entrega(_),
                Action::View | Action::Edit | Action::Create,
            ) => same_module(principal, resource),
            (ResourceRef::Usuario(_), _) => false,
            (_, Action::Delete | Action::Reserve) => false,
        },
        Role::Alumno => match (resource, action) {
            (ResourceRef::Entrega(entrega), Action::View) => entrega.alumno_id == principal.id(),
            (ResourceRef::Entrega(entrega), Action::Edit) => {
                entrega.alumno_id == principal.id() && !entrega.review_status.is_terminal()
            }
            (ResourceRef::Turno(_), Action::View | Action::Reserve) => {
                same_module(principal, resource)
            }
            (ResourceRef::Entrega(_), Action::Create | Action::Delete | Action::Reserve)
            | (ResourceRef::Turno(_), Action::Create | Action::Edit | Action::Delete)
            | (ResourceRef::Usuario(_), _) => false,
        },
    }
}

/// Like [`can_access`], but reports a denial as [`CoreError::AccessDenied`].
pub fn authorize(
    principal: &Principal,
    resource: ResourceRef<'_>,
    action: Action,
) -> Result<(), CoreError> {
    let allowed = can_access(principal, resource, action);
    debug!(
        principal = %principal.id(),
        role = %principal.role(),
        %action,
        resource = %resource.kind(),
        allowed,
        "access decision"
    );

    if allowed {
        Ok(())
    } else {
        Err(CoreError::AccessDenied {
            role: principal.role(),
            action,
            resource: resource.kind(),
        })
    }
}

/// Keeps the records `principal` is allowed to view, in their original order.
pub fn visible<'a, R: AsResource>(principal: &Principal, records: &'a [R]) -> Vec<&'a R> {
    records
        .iter()
        .filter(|record| can_access(principal, record.as_resource(), Action::View))
        .collect()
}

fn same_module(principal: &Principal, resource: ResourceRef<'_>) -> bool {
    match (principal.modulo(), resource.modulo()) {
        (Some(own), Some(target)) => own == target,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entrega, ReviewStatus, TurnoRecord, Usuario};
    use uuid::Uuid;

    const ACTIONS: [Action; 5] = [
        Action::View,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Reserve,
    ];

    fn turno(modulo: Option<&str>) -> TurnoRecord {
        TurnoRecord {
            id: Some(Uuid::new_v4()),
            titulo: Some("Clase de React".to_string()),
            modulo: modulo.map(str::to_string),
            ..TurnoRecord::default()
        }
    }

    fn entrega(alumno_id: Uuid, modulo: &str, review_status: ReviewStatus) -> Entrega {
        Entrega {
            id: Uuid::new_v4(),
            alumno_id,
            modulo: Some(modulo.to_string()),
            sprint: Some(3),
            github_link: Some("https://github.com/avery/sprint-3".to_string()),
            render_link: None,
            comentarios: None,
            review_status,
        }
    }

    fn usuario(modulo: &str) -> Usuario {
        Usuario {
            id: Uuid::new_v4(),
            nombre: "Avery Lee".to_string(),
            email: "avery@example.com".to_string(),
            role: Role::Alumno,
            modulo: Some(modulo.to_string()),
            cohort: Some(12),
        }
    }

    #[test]
    fn superadmin_may_do_anything() {
        let admin = Principal::superadmin(Uuid::new_v4());
        let turno = turno(None);
        let entrega = entrega(Uuid::new_v4(), "React", ReviewStatus::Aprobado);
        let usuario = usuario("React");
        for action in ACTIONS {
            assert!(can_access(&admin, turno.as_resource(), action));
            assert!(can_access(&admin, entrega.as_resource(), action));
            assert!(can_access(&admin, usuario.as_resource(), action));
        }
    }

    #[test]
    fn profesor_view_follows_module_equality() {
        let profesor = Principal::profesor(Uuid::new_v4(), "JAVASCRIPT").unwrap();
        for modulo in ["JAVASCRIPT", "javascript", "JAVASCRIPT ", "FRONTEND - REACT"] {
            let turno = turno(Some(modulo));
            let entrega = entrega(Uuid::new_v4(), modulo, ReviewStatus::ARevisar);
            let expected = modulo == "JAVASCRIPT";
            assert_eq!(can_access(&profesor, turno.as_resource(), Action::View), expected);
            assert_eq!(can_access(&profesor, entrega.as_resource(), Action::View), expected);
        }
    }

    #[test]
    fn profesor_cannot_create_outside_their_module() {
        let profesor = Principal::profesor(Uuid::new_v4(), "JAVASCRIPT").unwrap();
        let foreign = turno(Some("FRONTEND - REACT"));
        assert!(!can_access(&profesor, foreign.as_resource(), Action::Create));

        let own = turno(Some("JAVASCRIPT"));
        assert!(can_access(&profesor, own.as_resource(), Action::Create));
        assert!(can_access(&profesor, own.as_resource(), Action::Edit));
        assert!(!can_access(&profesor, own.as_resource(), Action::Delete));
        assert!(!can_access(&profesor, own.as_resource(), Action::Reserve));
    }

    #[test]
    fn profesor_never_manages_users() {
        let profesor = Principal::profesor(Uuid::new_v4(), "JAVASCRIPT").unwrap();
        let alumno = usuario("JAVASCRIPT");
        for action in ACTIONS {
            assert!(!can_access(&profesor, alumno.as_resource(), action));
        }
    }

    #[test]
    fn missing_resource_module_never_matches() {
        let profesor = Principal::profesor(Uuid::new_v4(), "JAVASCRIPT").unwrap();
        let alumno = Principal::alumno(Uuid::new_v4(), "JAVASCRIPT", Some(12)).unwrap();
        let untagged = turno(None);
        assert!(!can_access(&profesor, untagged.as_resource(), Action::View));
        assert!(!can_access(&alumno, untagged.as_resource(), Action::Reserve));
    }

    #[test]
    fn alumno_edits_only_own_unreviewed_entregas() {
        let alumno = Principal::alumno(Uuid::new_v4(), "React", Some(12)).unwrap();
        let other = Uuid::new_v4();
        let cases = [
            (alumno.id(), ReviewStatus::ARevisar, true),
            (alumno.id(), ReviewStatus::Aprobado, false),
            (alumno.id(), ReviewStatus::Desaprobado, false),
            (other, ReviewStatus::ARevisar, false),
            (other, ReviewStatus::Aprobado, false),
        ];
        for (owner, status, expected) in cases {
            let entrega = entrega(owner, "React", status);
            assert_eq!(can_access(&alumno, entrega.as_resource(), Action::Edit), expected);
        }
    }

    #[test]
    fn alumno_views_own_entregas_regardless_of_module() {
        let alumno = Principal::alumno(Uuid::new_v4(), "React", Some(12)).unwrap();
        let own = entrega(alumno.id(), "JAVASCRIPT", ReviewStatus::Aprobado);
        let foreign = entrega(Uuid::new_v4(), "React", ReviewStatus::ARevisar);
        assert!(can_access(&alumno, own.as_resource(), Action::View));
        assert!(!can_access(&alumno, foreign.as_resource(), Action::View));
        assert!(!can_access(&alumno, own.as_resource(), Action::Delete));
        assert!(!can_access(&alumno, own.as_resource(), Action::Create));
    }

    #[test]
    fn alumno_views_and_reserves_turnos_of_their_module() {
        let alumno = Principal::alumno(Uuid::new_v4(), "React", Some(12)).unwrap();
        let own = turno(Some("React"));
        let foreign = turno(Some("JAVASCRIPT"));
        assert!(can_access(&alumno, own.as_resource(), Action::View));
        assert!(can_access(&alumno, own.as_resource(), Action::Reserve));
        assert!(!can_access(&alumno, own.as_resource(), Action::Edit));
        assert!(!can_access(&alumno, own.as_resource(), Action::Create));
        assert!(!can_access(&alumno, foreign.as_resource(), Action::Reserve));
        assert!(!can_access(&alumno, usuario("React").as_resource(), Action::View));
    }

    #[test]
    fn authorize_reports_denials() {
        let alumno = Principal::alumno(Uuid::new_v4(), "React", None).unwrap();
        let turno = turno(Some("React"));
        assert_eq!(authorize(&alumno, turno.as_resource(), Action::Reserve), Ok(()));

        let denied = authorize(&alumno, turno.as_resource(), Action::Delete).unwrap_err();
        assert_eq!(
            denied,
            CoreError::AccessDenied {
                role: Role::Alumno,
                action: Action::Delete,
                resource: crate::models::ResourceKind::Turno,
            }
        );
        assert_eq!(denied.to_string(), "alumno may not delete this turno");
    }

    #[test]
    fn visible_filters_by_view_rule() {
        let profesor = Principal::profesor(Uuid::new_v4(), "React").unwrap();
        let turnos = vec![turno(Some("React")), turno(Some("JAVASCRIPT")), turno(Some("React"))];
        let shown = visible(&profesor, &turnos);
        assert_eq!(shown.len(), 2);
        assert!(shown.iter().all(|t| t.modulo.as_deref() == Some("React")));

        let admin = Principal::superadmin(Uuid::new_v4());
        assert_eq!(visible(&admin, &turnos).len(), 3);
    }
}
