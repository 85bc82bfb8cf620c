#![forbid(unsafe_code)]

use crate::{RenderContext, RenderError};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

const HEADER_FILL: u32 = 0x1F4E78;
const MAX_COLUMN_WIDTH: usize = 60;

struct Styles {
    title: Format,
    label: Format,
    body: Format,
    header: Format,
    count: Format,
    percent: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(14),
            label: Format::new().set_bold(),
            body: Format::new(),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            count: Format::new()
                .set_num_format("#,##0")
                .set_border(FormatBorder::Thin),
            percent: Format::new()
                .set_num_format("0.00%")
                .set_border(FormatBorder::Thin),
        }
    }
}

pub(crate) fn render(ctx: &RenderContext<'_>) -> Result<Vec<u8>, RenderError> {
    ctx.checkpoint(0)?;
    let styles = Styles::new();
    let mut workbook = Workbook::new();

    write_summary(ctx, workbook.add_worksheet(), &styles)
        .map_err(|err| ctx.encode_error(err))?;
    write_detail(ctx, workbook.add_worksheet(), &styles)?;

    workbook.save_to_buffer().map_err(|err| ctx.encode_error(err))
}

fn write_summary(
    ctx: &RenderContext<'_>,
    sheet: &mut Worksheet,
    styles: &Styles,
) -> Result<(), XlsxError> {
    let doc = ctx.doc;
    sheet.set_name("Summary")?;
    sheet.write_string_with_format(0, 0, doc.title.as_str(), &styles.title)?;

    let metadata = [
        ("Requested by", ctx.meta.requester()),
        ("Generated at", ctx.generated_at()),
        ("Period", doc.period.clone()),
    ];
    let mut row = 2u32;
    for (label, value) in &metadata {
        sheet.write_string_with_format(row, 0, *label, &styles.label)?;
        sheet.write_string_with_format(row, 1, value.as_str(), &styles.body)?;
        row += 1;
    }

    row += 1;
    for entry in &doc.summary {
        sheet.write_string_with_format(row, 0, entry.label.as_str(), &styles.label)?;
        sheet.write_number_with_format(row, 1, entry.value as f64, &styles.count)?;
        row += 1;
    }

    let value_width = metadata
        .iter()
        .map(|(_, value)| value.chars().count())
        .max()
        .unwrap_or(0);
    sheet.set_column_width(0, column_width(20))?;
    sheet.set_column_width(1, column_width(value_width))?;
    Ok(())
}

fn write_detail(
    ctx: &RenderContext<'_>,
    sheet: &mut Worksheet,
    styles: &Styles,
) -> Result<(), RenderError> {
    let encode = |err: XlsxError| ctx.encode_error(err);
    let label = ctx.doc.template.detail_label();
    let with_category = ctx.shows_category();
    sheet.set_name("Detail").map_err(encode)?;

    let mut headers = vec!["No", label];
    if with_category {
        headers.push("Category");
    }
    headers.extend(["Count", "Percentage"]);
    for (col, header) in (0u16..).zip(&headers) {
        sheet
            .write_string_with_format(0, col, *header, &styles.header)
            .map_err(encode)?;
    }
    let count_col: u16 = if with_category { 3 } else { 2 };

    let mut name_width = label.chars().count();
    let mut last_row = 0u32;
    for (done, detail) in ctx.detail_rows().enumerate() {
        ctx.checkpoint(done)?;
        let row = last_row + 1;
        sheet
            .write_number_with_format(row, 0, detail.index as f64, &styles.count)
            .map_err(encode)?;
        sheet
            .write_string_with_format(row, 1, detail.name, &styles.body)
            .map_err(encode)?;
        if let Some(category) = detail.category {
            sheet
                .write_string_with_format(row, 2, category, &styles.body)
                .map_err(encode)?;
        }
        sheet
            .write_number_with_format(row, count_col, detail.count as f64, &styles.count)
            .map_err(encode)?;
        sheet
            .write_number_with_format(row, count_col + 1, detail.share / 100.0, &styles.percent)
            .map_err(encode)?;
        name_width = name_width.max(detail.name.chars().count());
        last_row = row;
    }

    sheet
        .autofilter(0, 0, last_row, count_col + 1)
        .map_err(encode)?;
    let mut widths = vec![6, name_width];
    if with_category {
        widths.push(16);
    }
    widths.extend([12, 12]);
    for (col, width) in (0u16..).zip(widths) {
        sheet.set_column_width(col, column_width(width)).map_err(encode)?;
    }
    Ok(())
}

/// Character count plus padding, capped.
fn column_width(chars: usize) -> f64 {
    (chars.min(MAX_COLUMN_WIDTH) + 2) as f64
}
