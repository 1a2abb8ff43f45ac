use common::models::{Entity, RowSet};
use tera::{Context, Tera};

lazy_static::lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        let sources = vec![
            ("layout.html", include_str!("../templates/layout.html")),
            ("patients.html", include_str!("../templates/patients.html")),
            ("providers.html", include_str!("../templates/providers.html")),
        ];
        if let Err(e) = tera.add_raw_templates(sources) {
            tracing::error!("Template parsing error: {}", e);
            std::process::exit(1);
        }
        tera
    };
}

/// Render an entity's rows into its HTML view.
///
/// The rows are published under the entity's collection key.
pub fn render_rows<E: Entity>(rows: &RowSet<E>) -> Result<String, tera::Error> {
    let descriptor = E::DESCRIPTOR;
    let mut context = Context::new();
    context.insert(descriptor.collection_key, rows);
    TEMPLATES.render(descriptor.template, &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::models::{Patient, Provider};

    #[test]
    fn test_patients_view_lists_every_field() {
        let rows = RowSet::new(vec![Patient {
            patient_id: 42,
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 12),
        }]);

        let html = render_rows(&rows).unwrap();
        assert!(html.contains("<td>42</td>"));
        assert!(html.contains("John"));
        assert!(html.contains("Doe"));
        assert!(html.contains("1985-03-12"));
        assert!(!html.contains("No patients found"));
    }

    #[test]
    fn test_empty_providers_view() {
        let rows: RowSet<Provider> = RowSet::new(Vec::new());
        let html = render_rows(&rows).unwrap();
        assert!(html.contains("No providers found"));
    }

    #[test]
    fn test_missing_values_render_blank() {
        let rows = RowSet::new(vec![Provider {
            first_name: Some("Ana".to_string()),
            last_name: None,
            provider_specialty: None,
        }]);
        let html = render_rows(&rows).unwrap();
        assert!(html.contains("Ana"));
        assert!(!html.contains("null"));
    }

    #[test]
    fn test_values_are_html_escaped() {
        let rows = RowSet::new(vec![Provider {
            first_name: Some("<script>alert(1)</script>".to_string()),
            last_name: None,
            provider_specialty: None,
        }]);
        let html = render_rows(&rows).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
