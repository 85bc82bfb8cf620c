#![forbid(unsafe_code)]

use crate::format::{format_count, format_percentage};
use crate::{GENERATOR_NAME, RenderContext, RenderError};

/// Quotes a field when it holds a delimiter, quote or line break.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quoted(value)
    } else {
        value.to_string()
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn line(out: &mut String, fields: &[String]) {
    out.push_str(&fields.join(","));
    out.push_str("\r\n");
}

pub(crate) fn render(ctx: &RenderContext<'_>) -> Result<Vec<u8>, RenderError> {
    ctx.checkpoint(0)?;
    let doc = ctx.doc;
    let mut out = String::new();

    line(&mut out, &[field(&doc.title)]);
    line(&mut out, &[field("Requested by"), field(&ctx.meta.requester())]);
    line(&mut out, &[field("Generated at"), field(&ctx.generated_at())]);
    line(&mut out, &[field("Period"), field(&doc.period)]);
    out.push_str("\r\n");

    line(&mut out, &[field("Summary")]);
    for entry in &doc.summary {
        line(&mut out, &[field(&entry.label), field(&format_count(entry.value))]);
    }
    out.push_str("\r\n");

    let with_category = ctx.shows_category();
    let mut header = vec![field("No"), field(doc.template.detail_label())];
    if with_category {
        header.push(field("Category"));
    }
    header.extend([field("Count"), field("Percentage")]);
    line(&mut out, &header);

    for (done, detail) in ctx.detail_rows().enumerate() {
        ctx.checkpoint(done)?;
        let mut fields = vec![quoted(&detail.index.to_string()), quoted(detail.name)];
        if with_category {
            fields.push(quoted(detail.category.unwrap_or_default()));
        }
        fields.extend([
            quoted(&format_count(detail.count)),
            quoted(&format_percentage(detail.share)),
        ]);
        line(&mut out, &fields);
    }

    let mut total = vec![field("Total"), String::new()];
    if with_category {
        total.push(String::new());
    }
    total.extend([field(&format_count(doc.details_total())), String::new()]);
    line(&mut out, &total);
    out.push_str("\r\n");

    line(
        &mut out,
        &[field(&format!(
            "Generated by {GENERATOR_NAME} on {}",
            ctx.generated_at()
        ))],
    );
    Ok(out.into_bytes())
}
