//! Seed the database with a small demo catalog.
//!
//! Products point at the placeholder image served from `/static`, so no
//! uploads are needed. Running the command twice inserts the catalog twice.

use stitchline_core::Price;
use stitchline_storefront::db::Repositories;
use stitchline_storefront::models::{DesignCategoryInput, NewProduct, ProductCategoryInput};
use tracing::info;

use super::{CommandError, connect};

const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.svg";

/// `(name, description, price in rupees, size)` per product category.
const SHIRTS: &[(&str, &str, u32, &str)] = &[
    ("Rickshaw Tee", "Cotton tee with a hand-painted rickshaw panel", 1800, "M"),
    ("Peacock Tee", "Block-printed peacock motif on washed cotton", 2200, "L"),
];
const TOTES: &[(&str, &str, u32, &str)] = &[
    ("Bazaar Tote", "Heavy canvas tote with truck-art borders", 1300, "One size"),
    ("Chai Tote", "Everyday tote with a kettle and cups print", 950, "One size"),
];

/// Insert two product categories, one design collection and four products.
pub async fn demo_catalog() -> Result<(), CommandError> {
    let repos = Repositories::postgres(connect().await?);

    let design = repos
        .categories
        .create_design_category(&DesignCategoryInput {
            name: "Truck Art".to_owned(),
            theme: Some("Folk".to_owned()),
            release_date: None,
            description: Some("Bright borders and lettering from painted trucks".to_owned()),
        })
        .await?;
    info!(id = %design.id, "Created design category {}", design.name);

    for (category_name, products) in [("Shirts", SHIRTS), ("Totes", TOTES)] {
        let category = repos
            .categories
            .create_product_category(&ProductCategoryInput {
                name: category_name.to_owned(),
                description: None,
            })
            .await?;
        info!(id = %category.id, "Created product category {}", category.name);

        for &(name, description, rupees, size) in products {
            let product = repos
                .products
                .create(&NewProduct {
                    name: name.to_owned(),
                    description: description.to_owned(),
                    price: Price::from_rupees(rupees),
                    size: Some(size.to_owned()),
                    image_urls: vec![PLACEHOLDER_IMAGE.to_owned()],
                    category_id: category.id,
                    design_category_id: design.id,
                })
                .await?;
            info!(id = %product.id, "Created product {}", product.name);
        }
    }

    info!("Demo catalog seeded");
    Ok(())
}
