//! # Impress Core Views
//!
//! The root view contract and the host document it is mounted into.
//!
//! A [`RootView`] renders a [`ViewNode`] tree from the [`AppContext`]; the
//! kernel attaches the result to one attachment point of a [`HostDocument`]
//! as a [`MountedView`]. Rendering stops at building the tree: every
//! component reference in it has been resolved through the capability
//! registry, nothing more.
pub mod document;
pub mod error;
pub mod node;

use crate::kernel::context::AppContext;

pub use document::HostDocument;
pub use error::ViewError;
pub use node::{Props, ViewNode};

/// The single top-level view of the application
pub trait RootView {
    fn name(&self) -> &str;

    /// Build the view tree. Component nodes come from `ctx.capabilities()`.
    fn render(&self, ctx: &AppContext) -> Result<ViewNode, ViewError>;
}

/// A rendered root view attached to the host document
#[derive(Debug, Clone, PartialEq)]
pub struct MountedView {
    pub view_name: String,
    /// Attachment point id, without the leading `#`
    pub target: String,
    pub root: ViewNode,
}

impl MountedView {
    pub fn outline(&self) -> String {
        self.root.outline()
    }
}
