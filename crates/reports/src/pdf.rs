#![forbid(unsafe_code)]

//! A4 report built from Type1 Helvetica, so only ASCII text is drawn; other characters are
//! replaced with `?`.

use crate::format::{format_count, format_percentage, truncate};
use crate::{GENERATOR_NAME, RenderContext, RenderError};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const TABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// Lowest baseline for table rows; the footer sits below it.
const CONTENT_BOTTOM: f32 = 70.0;
const FOOTER_Y: f32 = 35.0;

const ROW_HEIGHT: f32 = 18.0;
const BODY_SIZE: f32 = 10.0;
const NAME_MAX_CHARS: usize = 48;

const CATEGORY_WIDTH: f32 = 90.0;

/// A detail table column. An empty header stands for the template's detail label.
#[derive(Clone, Copy)]
struct Column {
    header: &'static str,
    width: f32,
    left_aligned: bool,
}

impl Column {
    const fn left(header: &'static str, width: f32) -> Self {
        Self {
            header,
            width,
            left_aligned: true,
        }
    }

    const fn right(header: &'static str, width: f32) -> Self {
        Self {
            header,
            width,
            left_aligned: false,
        }
    }
}

/// Widths add up to the table width; the name column gives up room for a category.
fn detail_columns(with_category: bool) -> Vec<Column> {
    let mut columns = vec![Column::right("No", 40.0)];
    if with_category {
        columns.push(Column::left("", 285.0 - CATEGORY_WIDTH));
        columns.push(Column::left("Category", CATEGORY_WIDTH));
    } else {
        columns.push(Column::left("", 285.0));
    }
    columns.push(Column::right("Count", 85.0));
    columns.push(Column::right("Percentage", 85.0));
    columns
}

type Rgb = (f32, f32, f32);
const HEADER_FILL: Rgb = (0.12, 0.31, 0.47);
const STRIPE_FILL: Rgb = (0.93, 0.95, 0.97);
const BORDER: Rgb = (0.6, 0.6, 0.6);
const BLACK: Rgb = (0.0, 0.0, 0.0);
const WHITE: Rgb = (1.0, 1.0, 1.0);

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

fn num(value: f32) -> Object {
    value.into()
}

/// Printable ASCII only.
fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_ascii() && !ch.is_ascii_control() { ch } else { '?' })
        .collect()
}

/// Rough Helvetica advance width, used for right alignment.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.52
}

fn push_text(
    ops: &mut Vec<Operation>,
    x: f32,
    y: f32,
    font: Font,
    size: f32,
    color: Rgb,
    text: &str,
) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.resource().as_bytes().to_vec()), num(size)],
    ));
    ops.push(Operation::new("rg", vec![num(color.0), num(color.1), num(color.2)]));
    ops.push(Operation::new("Td", vec![num(x), num(y)]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(pdf_text(text))]));
    ops.push(Operation::new("ET", vec![]));
}

/// Lays out operations page by page, tracking the current baseline.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn fits(&self, height: f32) -> bool {
        self.y - height >= CONTENT_BOTTOM
    }

    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        push_text(self.ops(), x, y, font, size, color, text);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let ops = self.ops();
        ops.push(Operation::new("rg", vec![num(color.0), num(color.1), num(color.2)]));
        ops.push(Operation::new("re", vec![num(x), num(y), num(width), num(height)]));
        ops.push(Operation::new("f", vec![]));
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let ops = self.ops();
        ops.push(Operation::new("RG", vec![num(BORDER.0), num(BORDER.1), num(BORDER.2)]));
        ops.push(Operation::new("w", vec![num(0.5)]));
        ops.push(Operation::new("re", vec![num(x), num(y), num(width), num(height)]));
        ops.push(Operation::new("S", vec![]));
    }

    /// Advances past a line of `height` and returns its baseline.
    fn line(&mut self, height: f32) -> f32 {
        self.y -= height;
        self.y
    }
}

pub(crate) fn render(ctx: &RenderContext<'_>) -> Result<Vec<u8>, RenderError> {
    ctx.checkpoint(0)?;
    let doc = ctx.doc;
    let mut writer = PageWriter::new();

    let y = writer.line(18.0);
    writer.text(MARGIN, y, Font::Bold, 18.0, BLACK, &doc.title);
    writer.line(8.0);
    for (label, value) in [
        ("Requested by", ctx.meta.requester()),
        ("Generated at", ctx.generated_at()),
        ("Period", doc.period.clone()),
    ] {
        let y = writer.line(14.0);
        writer.text(MARGIN, y, Font::Bold, BODY_SIZE, BLACK, label);
        writer.text(MARGIN + 90.0, y, Font::Regular, BODY_SIZE, BLACK, &value);
    }

    writer.line(14.0);
    let y = writer.line(16.0);
    writer.text(MARGIN, y, Font::Bold, 12.0, BLACK, "Summary");
    writer.line(6.0);
    for (index, entry) in doc.summary.iter().enumerate() {
        if !writer.fits(ROW_HEIGHT) {
            writer.new_page();
        }
        let top = writer.y;
        let bottom = top - ROW_HEIGHT;
        if index % 2 == 1 {
            writer.fill_rect(MARGIN, bottom, TABLE_WIDTH, ROW_HEIGHT, STRIPE_FILL);
        }
        writer.stroke_rect(MARGIN, bottom, TABLE_WIDTH * 0.6, ROW_HEIGHT);
        writer.stroke_rect(MARGIN + TABLE_WIDTH * 0.6, bottom, TABLE_WIDTH * 0.4, ROW_HEIGHT);
        let baseline = bottom + 5.5;
        writer.text(MARGIN + 6.0, baseline, Font::Regular, BODY_SIZE, BLACK, &entry.label);
        let value = format_count(entry.value);
        let right = MARGIN + TABLE_WIDTH - 6.0 - text_width(&value, BODY_SIZE);
        writer.text(right, baseline, Font::Regular, BODY_SIZE, BLACK, &value);
        writer.y = bottom;
    }

    writer.line(20.0);
    if !writer.fits(16.0 + 2.0 * ROW_HEIGHT) {
        writer.new_page();
    }
    let y = writer.line(16.0);
    writer.text(MARGIN, y, Font::Bold, 12.0, BLACK, "Details");
    writer.line(6.0);
    let with_category = ctx.shows_category();
    let columns = detail_columns(with_category);
    let label = doc.template.detail_label();
    draw_detail_header(&mut writer, &columns, label);

    if doc.details.is_empty() {
        let y = writer.line(ROW_HEIGHT);
        let empty = "No data for this period.";
        writer.text(MARGIN + 6.0, y + 5.5, Font::Regular, BODY_SIZE, BLACK, empty);
    }
    for (done, detail) in ctx.detail_rows().enumerate() {
        ctx.checkpoint(done)?;
        if !writer.fits(ROW_HEIGHT) {
            writer.new_page();
            draw_detail_header(&mut writer, &columns, label);
        }
        let bottom = writer.y - ROW_HEIGHT;
        if done % 2 == 1 {
            writer.fill_rect(MARGIN, bottom, TABLE_WIDTH, ROW_HEIGHT, STRIPE_FILL);
        }
        let mut cells = vec![detail.index.to_string(), truncate(detail.name, NAME_MAX_CHARS)];
        if with_category {
            cells.push(detail.category.unwrap_or_default().to_string());
        }
        cells.extend([format_count(detail.count), format_percentage(detail.share)]);
        draw_row(&mut writer, bottom, &columns, &cells, Font::Regular, BLACK);
        writer.y = bottom;
    }

    let pages = finish_pages(writer.pages, &ctx.generated_at());
    assemble(pages).map_err(|err| ctx.encode_error(err))
}

fn draw_detail_header(writer: &mut PageWriter, columns: &[Column], detail_label: &str) {
    let bottom = writer.y - ROW_HEIGHT;
    writer.fill_rect(MARGIN, bottom, TABLE_WIDTH, ROW_HEIGHT, HEADER_FILL);
    let cells: Vec<String> = columns
        .iter()
        .map(|column| {
            if column.header.is_empty() {
                detail_label.to_string()
            } else {
                column.header.to_string()
            }
        })
        .collect();
    draw_row(writer, bottom, columns, &cells, Font::Bold, WHITE);
    writer.y = bottom;
}

/// Bordered cells; numeric columns are right-aligned.
fn draw_row(
    writer: &mut PageWriter,
    bottom: f32,
    columns: &[Column],
    cells: &[String],
    font: Font,
    color: Rgb,
) {
    let mut x = MARGIN;
    for (column, cell) in columns.iter().zip(cells) {
        writer.stroke_rect(x, bottom, column.width, ROW_HEIGHT);
        let text_x = if column.left_aligned {
            x + 6.0
        } else {
            x + column.width - 6.0 - text_width(cell, BODY_SIZE)
        };
        writer.text(text_x, bottom + 5.5, font, BODY_SIZE, color, cell);
        x += column.width;
    }
}

/// Appends the footer to every page once the page count is known.
fn finish_pages(mut pages: Vec<Vec<Operation>>, generated_at: &str) -> Vec<Vec<Operation>> {
    let total = pages.len();
    let left = format!("Generated by {GENERATOR_NAME} | {generated_at}");
    for (index, ops) in pages.iter_mut().enumerate() {
        push_text(ops, MARGIN, FOOTER_Y, Font::Regular, 8.0, BLACK, &left);
        let marker = format!("Page {} of {total}", index + 1);
        let right = PAGE_WIDTH - MARGIN - text_width(&marker, 8.0);
        push_text(ops, right, FOOTER_Y, Font::Regular, 8.0, BLACK, &marker);
    }
    pages
}

fn assemble(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, String> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let regular = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }.encode().map_err(|err| err.to_string())?;
        let content_id = document.add_object(Stream::new(dictionary! {}, content));
        let page_id: ObjectId = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).map_err(|err| err.to_string())?;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![num(0.0), num(0.0), num(PAGE_WIDTH), num(PAGE_HEIGHT)],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    document.save_to(&mut bytes).map_err(|err| err.to_string())?;
    Ok(bytes)
}
