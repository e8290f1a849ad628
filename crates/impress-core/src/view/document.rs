use crate::view::error::ViewError;
use crate::view::MountedView;

#[derive(Debug, Clone)]
struct AttachmentPoint {
    id: String,
    mounted: Option<MountedView>,
}

/// The host document views are mounted into
///
/// Holds named attachment points; each can hold at most one mounted view.
#[derive(Debug, Clone, Default)]
pub struct HostDocument {
    points: Vec<AttachmentPoint>,
}

impl HostDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document with a single attachment point.
    pub fn with_attachment_point(id: &str) -> Result<Self, ViewError> {
        let mut document = Self::new();
        document.add_attachment_point(id)?;
        Ok(document)
    }

    /// Add an empty attachment point; adding an existing id is a no-op.
    pub fn add_attachment_point(&mut self, id: &str) -> Result<(), ViewError> {
        let id = normalize_id(id)?;
        if !self.points.iter().any(|p| p.id == id) {
            self.points.push(AttachmentPoint { id, mounted: None });
        }
        Ok(())
    }

    pub fn has_attachment_point(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn attachment_points(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.id.as_str()).collect()
    }

    /// Put `view` into the attachment point `id`.
    pub fn attach(&mut self, id: &str, view: MountedView) -> Result<(), ViewError> {
        let wanted = normalize_id(id)?;
        let point = self
            .points
            .iter_mut()
            .find(|p| p.id == wanted)
            .ok_or_else(|| ViewError::AttachmentPointNotFound(wanted.clone()))?;
        if let Some(existing) = &point.mounted {
            return Err(ViewError::AlreadyMounted {
                target: wanted,
                view: existing.view_name.clone(),
            });
        }
        point.mounted = Some(view);
        Ok(())
    }

    /// View mounted at `id`, if any.
    pub fn mounted(&self, id: &str) -> Option<&MountedView> {
        self.find(id).and_then(|p| p.mounted.as_ref())
    }

    pub fn mounted_count(&self) -> usize {
        self.points.iter().filter(|p| p.mounted.is_some()).count()
    }

    fn find(&self, id: &str) -> Option<&AttachmentPoint> {
        let id = normalize_id(id).ok()?;
        self.points.iter().find(|p| p.id == id)
    }
}

/// Strip a leading `#` and reject empty or whitespace-containing ids.
pub fn normalize_id(id: &str) -> Result<String, ViewError> {
    let trimmed = id.trim().trim_start_matches('#');
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(ViewError::InvalidAttachmentPoint(id.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewNode;

    fn mounted(name: &str) -> MountedView {
        MountedView {
            view_name: name.to_string(),
            target: "app".to_string(),
            root: ViewNode::element("div"),
        }
    }

    #[test]
    fn test_ids_ignore_leading_hash() {
        let document = HostDocument::with_attachment_point("#app").unwrap();
        assert!(document.has_attachment_point("app"));
        assert!(document.has_attachment_point("#app"));
        assert_eq!(document.attachment_points(), vec!["app"]);
    }

    #[test]
    fn test_invalid_ids_are_rejected() {
        assert!(matches!(
            HostDocument::with_attachment_point("#"),
            Err(ViewError::InvalidAttachmentPoint(_))
        ));
        assert!(matches!(
            HostDocument::with_attachment_point("my app"),
            Err(ViewError::InvalidAttachmentPoint(_))
        ));
    }

    #[test]
    fn test_attach_once_per_point() {
        let mut document = HostDocument::with_attachment_point("app").unwrap();
        document.attach("#app", mounted("First")).unwrap();

        let err = document.attach("app", mounted("Second")).unwrap_err();
        assert!(matches!(err, ViewError::AlreadyMounted { ref view, .. } if view == "First"));
        assert_eq!(document.mounted("app").unwrap().view_name, "First");
        assert_eq!(document.mounted_count(), 1);
    }

    #[test]
    fn test_attach_to_missing_point() {
        let mut document = HostDocument::new();
        assert!(matches!(
            document.attach("app", mounted("Root")),
            Err(ViewError::AttachmentPointNotFound(ref id)) if id == "app"
        ));
        assert_eq!(document.mounted_count(), 0);
    }
}
