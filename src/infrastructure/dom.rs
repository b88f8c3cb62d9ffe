use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement};

use crate::application::ports::{BusyIndicator, Field, Surface};
use crate::domain::logging::LogComponent;
use crate::domain::{AppError, AppResult};
use crate::{log_debug, log_warn};

const SPIN_ANIMATION: &str = "spin 1s linear infinite";

fn js_error(value: JsValue) -> AppError {
    AppError::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// [`Surface`] over the live document.
#[derive(Clone)]
pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn from_window() -> AppResult<Self> {
        web_sys::window()
            .and_then(|window| window.document())
            .map(Self::new)
            .ok_or_else(|| AppError::Dom("document not available".into()))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn first(&self, selector: &str) -> AppResult<Option<Element>> {
        let found = self.document.query_selector(selector).map_err(js_error)?;
        if found.is_none() {
            log_debug!(LogComponent::Infrastructure("DOM"), "no element for {}", selector);
        }
        Ok(found)
    }

    fn all(&self, selector: &str) -> AppResult<Vec<Element>> {
        let nodes = self.document.query_selector_all(selector).map_err(js_error)?;
        Ok((0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect())
    }

    fn set_disabled(element: &Element, disabled: bool) {
        if let Some(button) = element.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if disabled {
            let _ = element.set_attribute("disabled", "");
        } else {
            let _ = element.remove_attribute("disabled");
        }
    }

    fn set_style(element: &Element, property: &str, value: Option<&str>) -> AppResult<()> {
        let Some(html) = element.dyn_ref::<HtmlElement>() else {
            return Ok(());
        };
        let style = html.style();
        match value {
            Some(value) => style.set_property(property, value).map_err(js_error),
            None => style.remove_property(property).map(drop).map_err(js_error),
        }
    }

    fn read_field(element: &Element, field: &Field<'_>) -> AppResult<Option<String>> {
        Ok(match *field {
            Field::Attribute(name) => element.get_attribute(name),
            Field::ChildAttribute { selector, name } => element
                .query_selector(selector)
                .map_err(js_error)?
                .and_then(|child| child.get_attribute(name)),
            Field::ChildText(selector) => element
                .query_selector(selector)
                .map_err(js_error)?
                .and_then(|child| child.text_content())
                .map(|text| text.trim().to_string()),
        })
    }

    fn apply_busy(&self, indicator: &BusyIndicator, busy: bool) -> AppResult<()> {
        match indicator {
            BusyIndicator::Spinner { trigger } => {
                if let Some(button) = self.first(trigger)? {
                    Self::set_disabled(&button, busy);
                }
                if let Some(icon) = self.first(&format!("{trigger} .refresh-icon"))? {
                    Self::set_style(&icon, "animation", busy.then_some(SPIN_ANIMATION))?;
                }
            }
            BusyIndicator::Label { trigger, busy_text, idle_text } => {
                if let Some(button) = self.first(trigger)? {
                    Self::set_disabled(&button, busy);
                    button.set_text_content(Some(if busy { busy_text } else { idle_text }));
                }
            }
            BusyIndicator::Overlay { overlay } => {
                if let Some(overlay) = self.first(overlay)? {
                    Self::set_style(&overlay, "display", Some(if busy { "flex" } else { "none" }))?;
                }
            }
            BusyIndicator::None => {}
        }
        Ok(())
    }
}

impl Surface for DomSurface {
    fn set_html(&self, selector: &str, html: &str) -> AppResult<()> {
        if let Some(element) = self.first(selector)? {
            element.set_inner_html(html);
        }
        Ok(())
    }

    fn set_text(&self, selector: &str, text: &str) -> AppResult<()> {
        if let Some(element) = self.first(selector)? {
            element.set_text_content(Some(text));
        }
        Ok(())
    }

    fn set_attribute(&self, selector: &str, name: &str, value: &str) -> AppResult<()> {
        match self.first(selector)? {
            Some(element) => element.set_attribute(name, value).map_err(js_error),
            None => Ok(()),
        }
    }

    fn toggle_class(&self, selector: &str, class: &str, on: bool) -> AppResult<()> {
        for element in self.all(selector)? {
            element.class_list().toggle_with_force(class, on).map_err(js_error)?;
        }
        Ok(())
    }

    fn set_busy(&self, indicator: &BusyIndicator, busy: bool) {
        if let Err(err) = self.apply_busy(indicator, busy) {
            log_warn!(LogComponent::Infrastructure("DOM"), "busy indicator update failed: {}", err);
        }
    }

    fn read_all(&self, selector: &str, fields: &[Field<'_>]) -> AppResult<Vec<Vec<Option<String>>>> {
        self.all(selector)?
            .iter()
            .map(|element| fields.iter().map(|field| Self::read_field(element, field)).collect())
            .collect()
    }
}
