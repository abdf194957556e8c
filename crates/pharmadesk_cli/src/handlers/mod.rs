pub(crate) mod account;
pub(crate) mod pharmacy;
pub(crate) mod purchasing;

use anyhow::{bail, Context, Result};
use pharmadesk_core::model::purchase::OrderItem;
use std::fs;
use std::path::Path;

/// Parses `name:quantity:price`; the name may itself contain colons.
pub(crate) fn parse_order_item(raw: &str) -> Result<OrderItem> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("item `{raw}` must look like name:quantity:price");
    };
    let quantity: u32 = quantity
        .trim()
        .parse()
        .with_context(|| format!("invalid quantity in item `{raw}`"))?;
    let price: f64 = price
        .trim()
        .parse()
        .with_context(|| format!("invalid price in item `{raw}`"))?;
    Ok(OrderItem::new(name.trim(), quantity, price))
}

/// Parses `medicine_id:quantity`; the quantity must be at least 1.
pub(crate) fn parse_sale_item(raw: &str) -> Result<(i64, u32)> {
    let Some((id, quantity)) = raw.split_once(':') else {
        bail!("item `{raw}` must look like medicine_id:quantity");
    };
    let id = id
        .trim()
        .parse()
        .with_context(|| format!("invalid medicine id in item `{raw}`"))?;
    let quantity: u32 = quantity
        .trim()
        .parse()
        .with_context(|| format!("invalid quantity in item `{raw}`"))?;
    if quantity == 0 {
        bail!("quantity in item `{raw}` must be at least 1");
    }
    Ok((id, quantity))
}

/// Parses every `--item`, adding up quantities for repeated ids.
/// Lines keep the order in which each id first appears.
pub(crate) fn parse_sale_items(raw_items: &[String]) -> Result<Vec<(i64, u32)>> {
    let mut lines: Vec<(i64, u32)> = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        let (id, quantity) = parse_sale_item(raw)?;
        match lines.iter_mut().find(|(line_id, _)| *line_id == id) {
            Some((_, total)) => {
                *total = total
                    .checked_add(quantity)
                    .with_context(|| format!("quantity for medicine {id} is too large"))?;
            }
            None => lines.push((id, quantity)),
        }
    }
    Ok(lines)
}

pub(crate) fn image_mime(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    Ok(match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => bail!("{} is not a png, jpeg, gif or webp image", path.display()),
    })
}

/// File bytes plus the mime type implied by the extension.
pub(crate) fn read_image(path: &Path) -> Result<(Vec<u8>, &'static str)> {
    let mime = image_mime(path)?;
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok((bytes, mime))
}
