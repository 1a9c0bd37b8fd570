use std::fmt::Write;

use chrono::NaiveDate;

use crate::access;
use crate::fixtures::Fixtures;
use crate::models::{Entrega, Principal, StatusSummary, TurnoEstado, TurnoRecord};

pub fn summarize_turnos(turnos: &[&TurnoRecord]) -> Vec<StatusSummary> {
    summarize(turnos.iter().map(|turno| {
        turno
            .estado
            .map_or_else(|| "Sin estado".to_string(), |estado| estado.to_string())
    }))
}

pub fn summarize_entregas(entregas: &[&Entrega]) -> Vec<StatusSummary> {
    summarize(entregas.iter().map(|entrega| entrega.review_status.to_string()))
}

fn summarize(labels: impl Iterator<Item = String>) -> Vec<StatusSummary> {
    let mut map: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();

    for label in labels {
        *map.entry(label).or_insert(0) += 1;
    }

    let mut summaries: Vec<StatusSummary> = map
        .into_iter()
        .map(|(label, count)| StatusSummary { label, count })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    summaries
}

pub fn build_report(principal: &Principal, fixtures: &Fixtures, today: NaiveDate) -> String {
    let turnos = access::visible(principal, &fixtures.turnos);
    let entregas = access::visible(principal, &fixtures.entregas);
    let usuarios = access::visible(principal, &fixtures.usuarios);

    let mut output = String::new();
    let scope = principal.modulo().unwrap_or("all modules");

    let _ = writeln!(output, "# Turnos Access Report");
    let _ = writeln!(
        output,
        "Generated for {} {} ({}) on {}",
        principal.role(),
        principal.id(),
        scope,
        today
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Turnos by Estado");

    if turnos.is_empty() {
        let _ = writeln!(output, "No turnos visible.");
    } else {
        for summary in summarize_turnos(&turnos) {
            let _ = writeln!(output, "- {}: {}", summary.label, summary.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Upcoming Available Turnos");

    let mut upcoming: Vec<&TurnoRecord> = turnos
        .iter()
        .copied()
        .filter(|turno| turno.estado == Some(TurnoEstado::Disponible))
        .filter(|turno| turno.fecha.is_some_and(|fecha| fecha >= today))
        .collect();
    upcoming.sort_by_key(|turno| turno.fecha);

    if upcoming.is_empty() {
        let _ = writeln!(output, "No upcoming turnos available.");
    } else {
        for turno in upcoming.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} on {} {} ({})",
                turno.titulo.as_deref().unwrap_or("Sin titulo"),
                turno.fecha.map(|fecha| fecha.to_string()).unwrap_or_default(),
                turno.horario.as_deref().unwrap_or(""),
                turno.modulo.as_deref().unwrap_or("sin modulo"),
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Entregas by Review Status");

    if entregas.is_empty() {
        let _ = writeln!(output, "No entregas visible.");
    } else {
        for summary in summarize_entregas(&entregas) {
            let _ = writeln!(output, "- {}: {}", summary.label, summary.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Usuarios");

    if usuarios.is_empty() {
        let _ = writeln!(output, "No usuarios visible.");
    } else {
        for usuario in usuarios.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}, {})",
                usuario.nombre, usuario.email, usuario.role
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReviewStatus, Role, Usuario};
    use uuid::Uuid;

    fn turno(titulo: &str, modulo: &str, fecha: (i32, u32, u32), estado: TurnoEstado) -> TurnoRecord {
        TurnoRecord {
            id: Some(Uuid::new_v4()),
            titulo: Some(titulo.to_string()),
            modulo: Some(modulo.to_string()),
            fecha: NaiveDate::from_ymd_opt(fecha.0, fecha.1, fecha.2),
            horario: Some("11:00 - 12:00".to_string()),
            estado: Some(estado),
            ..TurnoRecord::default()
        }
    }

    fn entrega(alumno_id: Uuid, review_status: ReviewStatus) -> Entrega {
        Entrega {
            id: Uuid::new_v4(),
            alumno_id,
            modulo: Some("FRONTEND - REACT".to_string()),
            sprint: Some(1),
            github_link: None,
            render_link: None,
            comentarios: None,
            review_status,
        }
    }

    fn fixtures(alumno_id: Uuid) -> Fixtures {
        Fixtures {
            usuarios: vec![Usuario {
                id: alumno_id,
                nombre: "Avery Lee".to_string(),
                email: "avery@example.com".to_string(),
                role: Role::Alumno,
                modulo: Some("FRONTEND - REACT".to_string()),
                cohort: Some(12),
            }],
            turnos: vec![
                turno("Hooks", "FRONTEND - REACT", (2026, 3, 9), TurnoEstado::Disponible),
                turno("Router", "FRONTEND - REACT", (2026, 3, 2), TurnoEstado::Disponible),
                turno("Pasado", "FRONTEND - REACT", (2026, 1, 5), TurnoEstado::Disponible),
                turno("Tomado", "FRONTEND - REACT", (2026, 3, 4), TurnoEstado::Solicitado),
                turno("Closures", "JAVASCRIPT", (2026, 3, 3), TurnoEstado::Disponible),
            ],
            entregas: vec![
                entrega(alumno_id, ReviewStatus::Aprobado),
                entrega(alumno_id, ReviewStatus::ARevisar),
                entrega(Uuid::new_v4(), ReviewStatus::Desaprobado),
            ],
        }
    }

    #[test]
    fn summaries_sort_by_count_then_label() {
        let a = turno("a", "m", (2026, 1, 1), TurnoEstado::Solicitado);
        let b = turno("b", "m", (2026, 1, 1), TurnoEstado::Disponible);
        let c = turno("c", "m", (2026, 1, 1), TurnoEstado::Solicitado);
        let d = TurnoRecord::default();
        let summaries = summarize_turnos(&[&a, &b, &c, &d]);
        let labels: Vec<(&str, usize)> = summaries
            .iter()
            .map(|summary| (summary.label.as_str(), summary.count))
            .collect();
        assert_eq!(
            labels,
            vec![("Solicitado", 2), ("Disponible", 1), ("Sin estado", 1)]
        );
    }

    #[test]
    fn alumno_report_only_shows_own_module_and_entregas() {
        let alumno_id = Uuid::new_v4();
        let alumno = Principal::alumno(alumno_id, "FRONTEND - REACT", Some(12)).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let report = build_report(&alumno, &fixtures(alumno_id), today);

        assert!(report.contains("Generated for alumno"));
        assert!(report.contains("- Disponible: 3"));
        assert!(report.contains("- Solicitado: 1"));
        assert!(!report.contains("Closures"));
        assert!(!report.contains("Pasado on"));
        assert!(report.contains("- Aprobado: 1"));
        assert!(report.contains("- A revisar: 1"));
        assert!(!report.contains("Desaprobado"));
        assert!(report.contains("No usuarios visible."));

        let router = report.find("- Router on 2026-03-02").unwrap();
        let hooks = report.find("- Hooks on 2026-03-09").unwrap();
        assert!(router < hooks);
    }

    #[test]
    fn superadmin_report_covers_everything() {
        let admin = Principal::superadmin(Uuid::new_v4());
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let report = build_report(&admin, &fixtures(Uuid::new_v4()), today);

        assert!(report.contains("(all modules)"));
        assert!(report.contains("- Disponible: 4"));
        assert!(report.contains("Closures"));
        assert!(report.contains("- Desaprobado: 1"));
        assert!(report.contains("- Avery Lee (avery@example.com, alumno)"));
    }

    #[test]
    fn empty_fixtures_render_placeholders() {
        let admin = Principal::superadmin(Uuid::new_v4());
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let report = build_report(&admin, &Fixtures::default(), today);
        assert!(report.contains("No turnos visible."));
        assert!(report.contains("No upcoming turnos available."));
        assert!(report.contains("No entregas visible."));
    }
}
