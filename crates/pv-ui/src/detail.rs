//! Detail pane for the selected file

use crate::file_list::FileEntry;
use eframe::egui;
use pv_pkg::result::field;
use pv_pkg::{PkgFields, ValidationResult};

/// Grouping of fields in the detail pane
const SECTIONS: [(&str, &[&str]); 5] = [
    (
        "PKG Information",
        &[
            field::PKG_TYPE,
            field::CATEGORY,
            field::PKG_FLAGS,
            field::CONTENT_TYPE,
            field::CONTENT_FLAGS,
        ],
    ),
    ("Identifiers", &[field::CONTENT_ID, field::TITLE_ID]),
    (
        "Version / Firmware",
        &[
            field::APP_VERSION,
            field::VERSION,
            field::MINIMUM_FIRMWARE,
            field::SYSTEM_VER,
        ],
    ),
    ("Compatibility", &[field::TROPHIES_PRESENT, field::BACKPORT]),
    (
        "File Structure",
        &[
            field::FILE_COUNT,
            field::ENTRY_COUNT,
            field::BODY_OFFSET,
            field::BODY_SIZE,
        ],
    ),
];

/// One group of rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSection {
    pub heading: &'static str,
    pub rows: Vec<(&'static str, String)>,
}

fn row_label(name: &'static str) -> &'static str {
    if name == field::SYSTEM_VER {
        "Raw SYSTEM_VER"
    } else {
        name
    }
}

/// Group the fields of a valid result; absent fields are left out
pub fn sections(fields: &PkgFields) -> Vec<DetailSection> {
    SECTIONS
        .iter()
        .map(|(heading, names)| DetailSection {
            heading,
            rows: names
                .iter()
                .filter_map(|name| fields.get(name).map(|value| (row_label(name), value.to_string())))
                .collect(),
        })
        .collect()
}

/// Draw the details of `entry`
pub fn show(ui: &mut egui::Ui, entry: &FileEntry) {
    let Some(result) = entry.result() else {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("Validating {}...", entry.name));
        });
        return;
    };

    match result {
        ValidationResult::Valid(fields) => {
            ui.heading(egui::RichText::new("✓ Valid PKG File").color(egui::Color32::DARK_GREEN));
            key_value(ui, "File", &entry.name);
            if let Some(size) = &entry.size {
                key_value(ui, "Size", size);
            }
            ui.separator();

            if let Some(title) = fields.get(field::TITLE) {
                ui.heading(title);
            }

            for section in sections(fields) {
                ui.add_space(6.0);
                ui.label(egui::RichText::new(section.heading).strong());
                ui.indent(section.heading, |ui| {
                    for (label, value) in &section.rows {
                        key_value(ui, label, value);
                    }
                });
            }
        }
        ValidationResult::Invalid(reason) => {
            ui.heading(egui::RichText::new("Invalid PKG File").color(egui::Color32::RED));
            key_value(ui, "File", &entry.name);
            key_value(ui, "Error", reason);
        }
    }
}

fn key_value(ui: &mut egui::Ui, key: &str, value: &str) {
    ui.horizontal_wrapped(|ui| {
        ui.label(egui::RichText::new(format!("{}:", key)).strong());
        ui.label(value);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_pkg::{validate_reader, PkgBuilder, SfoBuilder};
    use std::io::Cursor;

    fn fields() -> PkgFields {
        let sfo = SfoBuilder::new()
            .title("Detail Test")
            .category("gd")
            .system_ver(0x05050000)
            .generate();
        let data = PkgBuilder::new()
            .title_id("CUSA00042")
            .param_sfo(sfo)
            .build();

        match validate_reader(Cursor::new(data), "detail.pkg") {
            ValidationResult::Valid(fields) => fields,
            ValidationResult::Invalid(reason) => panic!("unexpected invalid result: {}", reason),
        }
    }

    #[test]
    fn test_section_order() {
        let headings: Vec<&str> = sections(&fields()).iter().map(|s| s.heading).collect();
        assert_eq!(
            headings,
            vec![
                "PKG Information",
                "Identifiers",
                "Version / Firmware",
                "Compatibility",
                "File Structure"
            ]
        );
    }

    #[test]
    fn test_section_rows() {
        let sections = sections(&fields());

        assert_eq!(sections[0].rows[0], ("PKG Type", "PS4 App".to_string()));
        assert_eq!(sections[0].rows[1], ("Category", "gd".to_string()));

        // No Content ID entry in the package
        assert_eq!(sections[1].rows, vec![("Title ID", "CUSA00042".to_string())]);

        assert_eq!(
            sections[2].rows,
            vec![
                ("Minimum Firmware", "5.05".to_string()),
                ("Raw SYSTEM_VER", "84213760".to_string()),
            ]
        );
        assert_eq!(sections[3].rows.len(), 2);
        assert_eq!(sections[4].rows.len(), 4);
    }

    #[test]
    fn test_sections_of_empty_fields() {
        let sections = sections(&PkgFields::default());
        assert_eq!(sections.len(), 5);
        assert!(sections.iter().all(|s| s.rows.is_empty()));
    }
}
