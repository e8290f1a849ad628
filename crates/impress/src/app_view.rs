use impress_core::view::{Props, RootView, ViewError, ViewNode};
use impress_core::AppContext;
use serde_json::{json, Value};

/// Rows shown in the table before paging kicks in
const PAGE_SIZE: usize = 20;

/// The root view of the application: navigation, an upload panel and the
/// tracked-item table.
#[derive(Debug, Default)]
pub struct AppView;

impl AppView {
    fn props(pairs: &[(&str, Value)]) -> Props {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn render_failed(&self, message: impl std::fmt::Display) -> ViewError {
        ViewError::RenderFailed {
            view: self.name().to_string(),
            message: message.to_string(),
        }
    }

    fn navigation(&self, ctx: &AppContext) -> Result<ViewNode, ViewError> {
        let caps = ctx.capabilities();
        Ok(caps
            .create("a-menu", Self::props(&[("mode", json!("horizontal"))]))?
            .with_children(vec![
                caps.create("a-menu-item", Self::props(&[("key", json!("items"))]))?
                    .with_child(ViewNode::text("Items")),
                caps.create("a-menu-item", Self::props(&[("key", json!("upload"))]))?
                    .with_child(ViewNode::text("Upload")),
            ]))
    }

    fn upload_panel(&self, ctx: &AppContext) -> Result<ViewNode, ViewError> {
        let caps = ctx.capabilities();
        let button = caps
            .create("a-button", Self::props(&[("type", json!("primary"))]))?
            .with_children(vec![
                caps.create("a-icon", Self::props(&[("type", json!("upload"))]))?,
                ViewNode::text("Select file"),
            ]);
        Ok(ViewNode::element("section")
            .with_attr("class", json!("upload"))
            .with_children(vec![
                caps.create("a-upload", Self::props(&[("name", json!("file"))]))?
                    .with_child(button),
                caps.create("a-progress", Props::new())?,
            ]))
    }

    fn item_table(&self, ctx: &AppContext) -> Result<ViewNode, ViewError> {
        let caps = ctx.capabilities();
        let table = ctx.store().table("data").map_err(|e| self.render_failed(e))?;
        let total = table.count().map_err(|e| self.render_failed(e))?;
        let rows = table.page(0, PAGE_SIZE).map_err(|e| self.render_failed(e))?;

        let mut columns = Vec::new();
        for field in &table.schema().fields {
            columns.push(caps.create(
                "a-table-column",
                Self::props(&[("data_index", json!(field.name)), ("title", json!(field.name))]),
            )?);
        }

        let grid = caps
            .create(
                "a-table",
                Self::props(&[
                    ("row_key", json!("url_crc")),
                    ("data_source", Value::Array(rows)),
                    ("total", json!(total)),
                ]),
            )?
            .with_children(columns);

        Ok(ViewNode::element("section")
            .with_attr("class", json!("items"))
            .with_children(vec![
                caps.create(
                    "a-input-search",
                    Self::props(&[("placeholder", json!("Filter by domain"))]),
                )?,
                caps.create("a-spin", Self::props(&[("spinning", json!(false))]))?
                    .with_child(grid),
            ]))
    }
}

impl RootView for AppView {
    fn name(&self) -> &str {
        "AppView"
    }

    fn render(&self, ctx: &AppContext) -> Result<ViewNode, ViewError> {
        Ok(ViewNode::element("div")
            .with_attr("class", json!("impress"))
            .with_children(vec![
                self.navigation(ctx)?,
                self.upload_panel(ctx)?,
                self.item_table(ctx)?,
            ]))
    }
}
