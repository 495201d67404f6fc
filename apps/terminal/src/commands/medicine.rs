//! Medicine list, search and admin commands.

use chrono::NaiveDate;
use std::path::Path;

use pharmadesk_client::{AppContext, ClientError, Transport};
use pharmadesk_core::{CatalogItem, ImageUpload, MedicineId, Money, NewMedicine, TaxRate};

use crate::error::ApiError;
use crate::render;

const ADD_USAGE: &str = "medicine add name=.. category=.. qty=.. buy=.. sell=.. [gst=..] \
                         [maker=..] [batch=..] [barcode=..] [expiry=YYYY-MM-DD] [image=path]";

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn table<T: Transport>(ctx: &AppContext<T>, items: &[CatalogItem]) -> String {
    render::catalog(items, ctx.config.ui.low_stock_threshold, today())
}

pub async fn list<T: Transport>(ctx: &AppContext<T>, search: Option<&str>) -> Result<String, ApiError> {
    let catalog = ctx.inventory.list(search).await?;
    Ok(table(ctx, catalog.items()))
}

/// Server search after the debounce delay. A newer search wins; the older
/// one prints nothing.
pub async fn search<T: Transport>(ctx: &AppContext<T>, term: &str) -> Result<String, ApiError> {
    match ctx.catalog.search_debounced(term).await? {
        Some(catalog) => Ok(table(ctx, catalog.items())),
        None => Ok(String::new()),
    }
}

/// Filters what is already loaded; no request.
pub fn find<T: Transport>(ctx: &AppContext<T>, term: &str) -> String {
    table(ctx, &ctx.catalog.filter_local(term))
}

pub async fn add<T: Transport>(
    ctx: &AppContext<T>,
    fields: Vec<(String, String)>,
) -> Result<String, ApiError> {
    let form = new_medicine(fields).await?;
    let name = form.name.trim().to_string();
    ctx.inventory
        .add_medicine(form)
        .await
        .map_err(|e| ApiError::from(e).notified())?;
    Ok(format!("Added {}", name))
}

pub async fn delete<T: Transport>(ctx: &AppContext<T>, id: MedicineId) -> Result<String, ApiError> {
    let deleted = ctx
        .inventory
        .delete_medicine(id)
        .await
        .map_err(|e| match e {
            ClientError::NotAuthenticated => ApiError::from(e),
            other => ApiError::from(other).notified(),
        })?;
    if deleted {
        Ok(format!("Medicine {} deleted", id))
    } else {
        Ok("Nothing deleted".to_string())
    }
}

// =============================================================================
// Form Parsing
// =============================================================================

async fn new_medicine(fields: Vec<(String, String)>) -> Result<NewMedicine, ApiError> {
    let mut form = NewMedicine {
        name: String::new(),
        category: String::new(),
        manufacturer: None,
        batch_number: None,
        barcode: None,
        quantity: 0,
        purchase_price: Money::zero(),
        selling_price: Money::zero(),
        tax_rate: TaxRate::zero(),
        expiry_date: None,
        image: None,
    };
    let mut seen = Vec::new();

    for (key, value) in fields {
        match key.as_str() {
            "name" => form.name = value,
            "category" => form.category = value,
            "qty" | "quantity" => form.quantity = integer(&key, &value)?,
            "buy" => form.purchase_price = Money::from_decimal(decimal(&key, &value)?),
            "sell" => form.selling_price = Money::from_decimal(decimal(&key, &value)?),
            "gst" => form.tax_rate = TaxRate::from_percentage(decimal(&key, &value)?),
            "maker" => form.manufacturer = Some(value),
            "batch" => form.batch_number = Some(value),
            "barcode" => form.barcode = Some(value),
            "expiry" => {
                let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .map_err(|_| ApiError::validation(format!("'{}' is not a YYYY-MM-DD date", value)))?;
                form.expiry_date = Some(date);
            }
            "image" => form.image = Some(read_image(Path::new(&value)).await?),
            _ => return Err(ApiError::usage(ADD_USAGE)),
        }
        seen.push(key);
    }

    for required in ["name", "category", "buy", "sell"] {
        if !seen.iter().any(|k| k == required) {
            return Err(ApiError::validation(format!("Missing {}=..", required)));
        }
    }
    if !seen.iter().any(|k| k == "qty" || k == "quantity") {
        return Err(ApiError::validation("Missing qty=.."));
    }
    Ok(form)
}

fn integer(key: &str, value: &str) -> Result<i64, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::validation(format!("{} must be a whole number", key)))
}

fn decimal(key: &str, value: &str) -> Result<f64, ApiError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::validation(format!("{} must be a number", key)))
}

async fn read_image(path: &Path) -> Result<ImageUpload, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ApiError::validation(format!("Cannot read image {}: {}", path.display(), e))
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let content_type = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return Err(ApiError::validation("Image must be png, jpg, gif or webp")),
    };

    Ok(ImageUpload {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string()),
        content_type: content_type.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::context;
    use pharmadesk_client::transport::RequestBody;
    use pharmadesk_client::Method;
    use pharmadesk_core::Role;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_list_flags_low_stock() {
        let (ctx, backend) = context(Some(Role::Staff));

        let text = list(&ctx, None).await.unwrap();
        let dolo = text.lines().find(|l| l.contains("Dolo 650")).unwrap();
        assert!(dolo.ends_with("LOW"), "{}", dolo);
        assert!(text.contains("Benadryl Syrup"));
        assert_eq!(backend.count(Method::Get, "/medicines"), 1);
    }

    #[tokio::test]
    async fn test_find_filters_loaded_list() {
        let (ctx, backend) = context(Some(Role::Staff));
        assert_eq!(find(&ctx, "dolo"), "No medicines found");

        list(&ctx, None).await.unwrap();
        let text = find(&ctx, "8901234");
        assert!(text.contains("Dolo 650"));
        assert!(!text.contains("Benadryl"));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_waits_for_debounce() {
        let (ctx, backend) = context(Some(Role::Staff));

        let text = search(&ctx, "dolo").await.unwrap();
        assert!(text.contains("Dolo 650"));
        let request = &backend.calls()[0];
        assert_eq!(request.query, vec![("search".to_string(), "dolo".to_string())]);
    }

    #[tokio::test]
    async fn test_add_medicine_with_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("zinc.PNG");
        std::fs::write(&image, b"\x89PNG").unwrap();
        let (ctx, backend) = context(Some(Role::Admin));

        let text = add(
            &ctx,
            fields(&[
                ("name", "Zinc 50"),
                ("category", "Supplement"),
                ("qty", "40"),
                ("buy", "3.5"),
                ("sell", "5"),
                ("gst", "12"),
                ("expiry", "2027-06-30"),
                ("image", image.to_str().unwrap()),
            ]),
        )
        .await
        .unwrap();
        assert_eq!(text, "Added Zinc 50");

        let post = backend
            .calls()
            .into_iter()
            .find(|r| r.method == Method::Post && r.path == "/medicines")
            .unwrap();
        let RequestBody::Multipart(form) = post.body else {
            panic!("expected multipart");
        };
        assert!(form.fields.contains(&("medicine_name".to_string(), "Zinc 50".to_string())));
        let (key, upload) = form.file.unwrap();
        assert_eq!(key, "image");
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.file_name, "zinc.PNG");
    }

    #[tokio::test]
    async fn test_add_medicine_input_errors() {
        let (ctx, backend) = context(Some(Role::Admin));

        let err = add(&ctx, fields(&[("name", "Zinc"), ("category", "S"), ("buy", "1")]))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Missing sell=..");

        let err = add(&ctx, fields(&[("qty", "ten")])).await.unwrap_err();
        assert_eq!(err.message, "qty must be a whole number");

        let err = add(&ctx, fields(&[("colour", "red")])).await.unwrap_err();
        assert!(err.message.starts_with("Usage: medicine add"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_staff_cannot_add() {
        let (ctx, backend) = context(Some(Role::Staff));

        let err = add(
            &ctx,
            fields(&[("name", "Zinc"), ("category", "S"), ("qty", "1"), ("buy", "1"), ("sell", "2")]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(err.notified);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_after_confirmation() {
        let (ctx, backend) = context(Some(Role::Admin));
        let mut prompts = ctx.confirmations.watch();

        let pending = tokio::spawn({
            let ctx = ctx.clone();
            async move { delete(&ctx, MedicineId(2)).await }
        });
        prompts.wait_for(|p| p.is_some()).await.unwrap();
        ctx.confirmations.respond(true).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), "Medicine 2 deleted");
        assert_eq!(backend.count(Method::Delete, "/medicines/2"), 1);
        assert_eq!(backend.count(Method::Get, "/medicines"), 1);
    }
}
