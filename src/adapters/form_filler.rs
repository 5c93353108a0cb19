use std::path::{Path, PathBuf};

use error_stack::{report, ResultExt};
use lopdf::{Document, Object, ObjectId};
use thiserror::Error;
use tracing::instrument;

use crate::config::pdf_config::PdfConfig;
use crate::domain::field_map::FieldMap;

#[derive(Error, Debug)]
pub enum FormFillError {
    #[error("failed to open the PDF template")]
    TemplateRead,
    #[error("failed to write the filled PDF")]
    FormWrite,
}

#[derive(Debug, Clone)]
pub struct FormFiller {
    config: PdfConfig,
}

impl FormFiller {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    /// Fills the template's form fields and writes the output file,
    /// returning the path written.
    ///
    /// The template is never modified: the whole document is loaded, pages
    /// in original order, and serialized to the output path, fully
    /// overwriting any prior file there. Values are assigned to the first
    /// page's widget annotations only, regardless of where a same-named
    /// field lives; fields on later pages stay untouched. The AcroForm
    /// stays attached to the catalog and is flagged `NeedAppearances` so
    /// viewers regenerate appearance streams for the new values.
    #[instrument(skip(fields))]
    pub fn fill(&self, fields: &FieldMap) -> error_stack::Result<PathBuf, FormFillError> {
        let template = Path::new(&*self.config.template_path);
        let mut doc = Document::load(template)
            .change_context(FormFillError::TemplateRead)
            .attach_printable_lazy(|| format!("template {}", template.display()))?;

        let first_page = *doc
            .get_pages()
            .values()
            .next()
            .ok_or_else(|| report!(FormFillError::TemplateRead))
            .attach_printable("template has no pages")?;

        mark_need_appearances(&mut doc);
        let updated = set_page_fields(&mut doc, first_page, fields);
        tracing::debug!(updated, "form field values assigned");

        let output = PathBuf::from(&*self.config.output_path);
        doc.save(&output)
            .change_context(FormFillError::FormWrite)
            .attach_printable_lazy(|| format!("output {}", output.display()))?;
        Ok(output)
    }
}

/// Flags the document's AcroForm with `NeedAppearances`. Without it, many
/// viewers keep rendering the stale (empty) appearance streams and the
/// filled values stay invisible. Documents without an interactive form are
/// left alone.
fn mark_need_appearances(doc: &mut Document) {
    let catalog_id = match doc.trailer.get(b"Root").and_then(Object::as_reference) {
        Ok(id) => id,
        Err(_) => return,
    };
    let acroform = doc
        .get_dictionary(catalog_id)
        .ok()
        .and_then(|catalog| catalog.get(b"AcroForm").ok().cloned());

    match acroform {
        Some(Object::Reference(form_id)) => {
            if let Ok(form) = doc.get_object_mut(form_id).and_then(Object::as_dict_mut) {
                form.set("NeedAppearances", true);
            }
        }
        Some(Object::Dictionary(mut form)) => {
            form.set("NeedAppearances", true);
            if let Ok(catalog) = doc.get_object_mut(catalog_id).and_then(Object::as_dict_mut) {
                catalog.set("AcroForm", Object::Dictionary(form));
            }
        }
        _ => {}
    }
}

/// Assigns values to the widget annotations of one page. Returns how many
/// widgets were updated.
fn set_page_fields(doc: &mut Document, page_id: ObjectId, fields: &FieldMap) -> usize {
    let targets: Vec<(ObjectId, String)> = page_annotations(doc, page_id)
        .into_iter()
        .filter_map(|annot_id| {
            let name = field_name(doc, annot_id)?;
            let value = fields.get(&name)?;
            Some((annot_id, value.clone()))
        })
        .collect();

    let updated = targets.len();
    for (annot_id, value) in targets {
        if let Ok(annot) = doc.get_object_mut(annot_id).and_then(Object::as_dict_mut) {
            annot.set("V", Object::string_literal(value));
            // A stale appearance stream would keep showing the old value.
            annot.remove(b"AP");
        }
    }
    updated
}

/// Annotation object ids of one page, with an indirect `/Annots` array
/// dereferenced. Inline (non-referenced) annotation dictionaries are rare
/// enough in form templates to ignore.
fn page_annotations(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let annots = match page.get(b"Annots") {
        Ok(Object::Array(array)) => array.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(array)) => array.clone(),
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    annots
        .iter()
        .filter_map(|entry| entry.as_reference().ok())
        .collect()
}

/// Partial field name of an annotation, following `/Parent` when the widget
/// itself carries no `/T`. Parent chains in AcroForms are shallow; the walk
/// is bounded anyway.
fn field_name(doc: &Document, annot_id: ObjectId) -> Option<String> {
    let mut current = annot_id;
    for _ in 0..8 {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(Object::String(bytes, _)) = dict.get(b"T") {
            return Some(String::from_utf8_lossy(bytes).into_owned());
        }
        current = match dict.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return None,
        };
    }
    None
}


#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Document;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn filler_for(dir: &TempDir) -> FormFiller {
        let template = dir.path().join("template.pdf");
        test_support::write_template(&template);
        FormFiller::new(PdfConfig {
            template_path: template.to_string_lossy().into_owned().into(),
            output_path: dir
                .path()
                .join("filled.pdf")
                .to_string_lossy()
                .into_owned()
                .into(),
        })
    }

    fn fields(entries: &[(&str, &str)]) -> FieldMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn widget_values(doc: &Document) -> BTreeMap<String, Option<String>> {
        let mut values = BTreeMap::new();
        for page_id in doc.get_pages().values() {
            for annot_id in page_annotations(doc, *page_id) {
                let Some(name) = field_name(doc, annot_id) else {
                    continue;
                };
                let value = doc.get_dictionary(annot_id).ok().and_then(|dict| {
                    match dict.get(b"V") {
                        Ok(Object::String(bytes, _)) => {
                            Some(String::from_utf8_lossy(bytes).into_owned())
                        }
                        _ => None,
                    }
                });
                values.insert(name, value);
            }
        }
        values
    }

    #[test]
    fn output_keeps_page_count_and_acroform() {
        let dir = TempDir::new().unwrap();
        let filler = filler_for(&dir);

        let output = filler
            .fill(&fields(&[("Owner Name", "Jane Roe")]))
            .unwrap();

        let doc = Document::load(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 2);

        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .unwrap();
        let catalog = doc.get_dictionary(catalog_id).unwrap();
        let form_id = catalog
            .get(b"AcroForm")
            .and_then(Object::as_reference)
            .unwrap();
        let form = doc.get_dictionary(form_id).unwrap();
        let fields_array = form.get(b"Fields").unwrap();
        assert!(matches!(fields_array, Object::Array(a) if !a.is_empty()));
        assert_eq!(form.get(b"NeedAppearances").unwrap(), &Object::Boolean(true));
    }

    #[test]
    fn values_land_on_first_page_only() {
        let dir = TempDir::new().unwrap();
        let filler = filler_for(&dir);

        let output = filler
            .fill(&fields(&[
                ("Owner Name", "Jane Roe"),
                ("Scope", "Full demolition"),
            ]))
            .unwrap();

        let doc = Document::load(&output).unwrap();
        let values = widget_values(&doc);
        assert_eq!(values["Owner Name"], Some("Jane Roe".to_string()));
        // "Scope" lives on page two; the first-page-only rule leaves it alone.
        assert_eq!(values["Scope"], None);
    }

    #[test]
    fn second_run_overwrites_the_first() {
        let dir = TempDir::new().unwrap();
        let filler = filler_for(&dir);

        let first = filler.fill(&fields(&[("Owner Name", "First Owner")])).unwrap();
        let second = filler
            .fill(&fields(&[("Owner Name", "Second Owner")]))
            .unwrap();
        assert_eq!(first, second);

        let doc = Document::load(&second).unwrap();
        let values = widget_values(&doc);
        assert_eq!(values["Owner Name"], Some("Second Owner".to_string()));
    }

    #[test]
    fn unknown_fields_in_the_map_are_ignored() {
        let dir = TempDir::new().unwrap();
        let filler = filler_for(&dir);

        let output = filler
            .fill(&fields(&[
                ("Owner Name", "Jane Roe"),
                ("No Such Field", "ignored"),
            ]))
            .unwrap();

        let doc = Document::load(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert_eq!(
            widget_values(&doc)["Owner Name"],
            Some("Jane Roe".to_string())
        );
    }

    #[test]
    fn missing_template_reports_template_read() {
        let dir = TempDir::new().unwrap();
        let filler = FormFiller::new(PdfConfig {
            template_path: dir
                .path()
                .join("no_such_template.pdf")
                .to_string_lossy()
                .into_owned()
                .into(),
            output_path: dir
                .path()
                .join("filled.pdf")
                .to_string_lossy()
                .into_owned()
                .into(),
        });

        let err = filler.fill(&FieldMap::new()).unwrap_err();
        assert!(matches!(err.current_context(), FormFillError::TemplateRead));
    }
}
