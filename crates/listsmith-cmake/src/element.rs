use crate::value::ValueMap;

/// Anything that can be written into a lists document.
pub trait Element {
    /// Append this element's text to `out`.
    fn append_to(&self, out: &mut String, values: Option<&ValueMap>);

    fn text(&self, values: Option<&ValueMap>) -> String {
        let mut out = String::new();
        self.append_to(&mut out, values);
        out
    }

    fn is_add_eol(&self) -> bool;

    fn set_add_eol(&mut self, add_eol: bool);
}
