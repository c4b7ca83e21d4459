//! In-memory implementation of every repository trait.
//!
//! Used by unit and router tests. Mirrors the `PostgreSQL` semantics the
//! services rely on: unique emails, owner-filtered writes, restricted
//! category deletes and cascading product deletes. Faults can be injected
//! into order inserts and cart deletes to exercise partial checkouts.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stitchline_core::{
    CartItemId, DesignCategoryId, Email, NotificationId, OrderId, OrderStatus, ProductCategoryId,
    ProductId, Quantity, Rating, ReviewId, Role, UserId,
};

use super::{
    CartRepository, CategoryRepository, NotificationRepository, OrderRepository,
    ProductRepository, RepositoryError, ReviewRepository, UserRepository,
};
use crate::models::{
    CartItem, CartLine, CartProduct, DesignCategory, DesignCategoryInput, NewCartItem, NewOrder,
    NewProduct, NewReview, NewUser, Notification, Order, Product, ProductCategory,
    ProductCategoryInput, ProductUpdate, Review, User,
};

struct StoredUser {
    user: User,
    password_hash: String,
    reset_code: Option<(String, DateTime<Utc>)>,
}

struct StoredReview {
    id: ReviewId,
    user_id: UserId,
    product_id: ProductId,
    rating: Rating,
    comment: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: Vec<StoredUser>,
    product_categories: Vec<ProductCategory>,
    design_categories: Vec<DesignCategory>,
    products: Vec<Product>,
    cart: Vec<CartItem>,
    orders: Vec<Order>,
    reviews: Vec<StoredReview>,
    notifications: Vec<Notification>,
    order_inserts_before_failure: Option<usize>,
    fail_cart_deletes: bool,
}

impl Tables {
    const fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: UserId) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.user.id == id)
    }

    fn product_category_in_use(&self, id: ProductCategoryId) -> bool {
        self.products.iter().any(|p| p.category_id == id)
            || self.cart.iter().any(|c| c.product_category_id == id)
    }

    fn design_category_in_use(&self, id: DesignCategoryId) -> bool {
        self.products.iter().any(|p| p.design_category_id == id)
            || self.cart.iter().any(|c| c.design_category_id == id)
    }
}

fn injected() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

fn unknown_reference() -> RepositoryError {
    RepositoryError::Conflict("referenced row does not exist".to_owned())
}

/// A thread-safe, process-local datastore.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Let `successes` more order inserts through, then fail every insert after.
    pub fn fail_order_inserts_after(&self, successes: usize) {
        self.lock().order_inserts_before_failure = Some(successes);
    }

    /// Make every cart delete fail.
    pub fn fail_cart_deletes(&self) {
        self.lock().fail_cart_deletes = true;
    }

    /// Stored password hash for an email, for asserting on resets.
    #[must_use]
    pub fn password_hash(&self, email: &Email) -> Option<String> {
        self.lock()
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .map(|u| u.password_hash.clone())
    }

    /// Stored reset code for an email.
    #[must_use]
    pub fn reset_code(&self, email: &Email) -> Option<String> {
        self.lock()
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .and_then(|u| u.reset_code.as_ref().map(|(code, _)| code.clone()))
    }

    /// Move an account's reset code expiry, for exercising expired codes.
    pub fn expire_reset_code(&self, email: &Email, at: DateTime<Utc>) {
        let mut tables = self.lock();
        if let Some(stored) = tables.users.iter_mut().find(|u| &u.user.email == email)
            && let Some((_, expires_at)) = stored.reset_code.as_mut()
        {
            *expires_at = at;
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.user.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::new(tables.next_id()),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            phone_number: user.phone_number.clone(),
            alt_phone_number: user.alt_phone_number.clone(),
            address: user.address.clone(),
            city: user.city.clone(),
            created_at: Utc::now(),
        };
        tables.users.push(StoredUser {
            user: created.clone(),
            password_hash: user.password_hash.clone(),
            reset_code: None,
        });
        Ok(created)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().user(id).map(|u| u.user.clone()))
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        Ok(self.lock().user(id).map(|u| u.password_hash.clone()))
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.lock().users.iter().map(|u| u.user.clone()).collect())
    }

    async fn update_name(
        &self,
        id: UserId,
        full_name: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.lock();
        Ok(tables
            .users
            .iter_mut()
            .find(|u| u.user.id == id)
            .map(|u| {
                full_name.clone_into(&mut u.user.full_name);
                u.user.clone()
            }))
    }

    async fn set_role(&self, id: UserId, role: Role) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.lock();
        Ok(tables
            .users
            .iter_mut()
            .find(|u| u.user.id == id)
            .map(|u| {
                u.user.role = role;
                u.user.clone()
            }))
    }

    async fn store_reset_code(
        &self,
        email: &Email,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let Some(stored) = tables.users.iter_mut().find(|u| &u.user.email == email) else {
            return Ok(false);
        };
        stored.reset_code = Some((code.to_owned(), expires_at));
        Ok(true)
    }

    async fn reset_password(
        &self,
        email: &Email,
        code: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let Some(stored) = tables.users.iter_mut().find(|u| &u.user.email == email) else {
            return Ok(false);
        };
        let matches = stored
            .reset_code
            .as_ref()
            .is_some_and(|(stored_code, expires_at)| stored_code == code && *expires_at > now);
        if matches {
            password_hash.clone_into(&mut stored.password_hash);
            stored.reset_code = None;
        }
        Ok(matches)
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products = self.lock().products.clone();
        products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_i32().cmp(&a.id.as_i32()))
        });
        Ok(products)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.lock();
        let categories_exist = tables
            .product_categories
            .iter()
            .any(|c| c.id == product.category_id)
            && tables
                .design_categories
                .iter()
                .any(|c| c.id == product.design_category_id);
        if !categories_exist {
            return Err(RepositoryError::Conflict("unknown category".to_owned()));
        }

        let created = Product {
            id: ProductId::new(tables.next_id()),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            size: product.size.clone(),
            image_urls: product.image_urls.clone(),
            category_id: product.category_id,
            design_category_id: product.design_category_id,
            created_at: Utc::now(),
        };
        tables.products.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.lock();
        let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &update.description {
            product.description.clone_from(description);
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if update.size.is_some() {
            product.size.clone_from(&update.size);
        }
        if let Some(category_id) = update.category_id {
            product.category_id = category_id;
        }
        if let Some(design_category_id) = update.design_category_id {
            product.design_category_id = design_category_id;
        }
        if let Some(image_urls) = &update.image_urls {
            product.image_urls.clone_from(image_urls);
        }
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        if tables.products.len() == before {
            return Ok(false);
        }
        // Same cascades as the schema
        tables.cart.retain(|c| c.product_id != id);
        tables.reviews.retain(|r| r.product_id != id);
        for order in tables.orders.iter_mut().filter(|o| o.product_id == Some(id)) {
            order.product_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn list_product_categories(&self) -> Result<Vec<ProductCategory>, RepositoryError> {
        let mut categories = self.lock().product_categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_product_category(
        &self,
        id: ProductCategoryId,
    ) -> Result<Option<ProductCategory>, RepositoryError> {
        Ok(self
            .lock()
            .product_categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn create_product_category(
        &self,
        input: &ProductCategoryInput,
    ) -> Result<ProductCategory, RepositoryError> {
        let mut tables = self.lock();
        let category = ProductCategory {
            id: ProductCategoryId::new(tables.next_id()),
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: Utc::now(),
        };
        tables.product_categories.push(category.clone());
        Ok(category)
    }

    async fn update_product_category(
        &self,
        id: ProductCategoryId,
        input: &ProductCategoryInput,
    ) -> Result<Option<ProductCategory>, RepositoryError> {
        let mut tables = self.lock();
        Ok(tables
            .product_categories
            .iter_mut()
            .find(|c| c.id == id)
            .map(|c| {
                c.name.clone_from(&input.name);
                c.description.clone_from(&input.description);
                c.clone()
            }))
    }

    async fn delete_product_category(
        &self,
        id: ProductCategoryId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        if tables.product_category_in_use(id) {
            return Err(RepositoryError::Conflict(
                "category is still used by products or carts".to_owned(),
            ));
        }
        let before = tables.product_categories.len();
        tables.product_categories.retain(|c| c.id != id);
        Ok(tables.product_categories.len() < before)
    }

    async fn list_design_categories(&self) -> Result<Vec<DesignCategory>, RepositoryError> {
        let mut categories = self.lock().design_categories.clone();
        categories.sort_by(|a, b| {
            b.release_date
                .cmp(&a.release_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(categories)
    }

    async fn get_design_category(
        &self,
        id: DesignCategoryId,
    ) -> Result<Option<DesignCategory>, RepositoryError> {
        Ok(self
            .lock()
            .design_categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn create_design_category(
        &self,
        input: &DesignCategoryInput,
    ) -> Result<DesignCategory, RepositoryError> {
        let mut tables = self.lock();
        let category = DesignCategory {
            id: DesignCategoryId::new(tables.next_id()),
            name: input.name.clone(),
            theme: input.theme.clone(),
            release_date: input.release_date,
            description: input.description.clone(),
            created_at: Utc::now(),
        };
        tables.design_categories.push(category.clone());
        Ok(category)
    }

    async fn update_design_category(
        &self,
        id: DesignCategoryId,
        input: &DesignCategoryInput,
    ) -> Result<Option<DesignCategory>, RepositoryError> {
        let mut tables = self.lock();
        Ok(tables
            .design_categories
            .iter_mut()
            .find(|c| c.id == id)
            .map(|c| {
                c.name.clone_from(&input.name);
                c.theme.clone_from(&input.theme);
                c.release_date = input.release_date;
                c.description.clone_from(&input.description);
                c.clone()
            }))
    }

    async fn delete_design_category(&self, id: DesignCategoryId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        if tables.design_category_in_use(id) {
            return Err(RepositoryError::Conflict(
                "category is still used by products or carts".to_owned(),
            ));
        }
        let before = tables.design_categories.len();
        tables.design_categories.retain(|c| c.id != id);
        Ok(tables.design_categories.len() < before)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<CartLine>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .cart
            .iter()
            .filter(|c| owner.is_none_or(|o| c.user_id == o))
            .map(|item| {
                let product = tables
                    .products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|p| CartProduct {
                        name: p.name.clone(),
                        price: p.price,
                        size: p.size.clone(),
                        image_url: p.primary_image().map(str::to_owned),
                    });
                CartLine {
                    item: item.clone(),
                    product,
                }
            })
            .collect())
    }

    async fn insert(&self, item: &NewCartItem) -> Result<CartItem, RepositoryError> {
        let mut tables = self.lock();
        let references_exist = tables.user(item.user_id).is_some()
            && tables.products.iter().any(|p| p.id == item.product_id)
            && tables
                .product_categories
                .iter()
                .any(|c| c.id == item.product_category_id)
            && tables
                .design_categories
                .iter()
                .any(|c| c.id == item.design_category_id);
        if !references_exist {
            return Err(unknown_reference());
        }

        let created = CartItem {
            id: CartItemId::new(tables.next_id()),
            user_id: item.user_id,
            product_id: item.product_id,
            product_category_id: item.product_category_id,
            design_category_id: item.design_category_id,
            quantity: item.quantity,
            created_at: Utc::now(),
        };
        tables.cart.push(created.clone());
        Ok(created)
    }

    async fn update_quantity(
        &self,
        id: CartItemId,
        owner: Option<UserId>,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut tables = self.lock();
        Ok(tables
            .cart
            .iter_mut()
            .find(|c| c.id == id && owner.is_none_or(|o| c.user_id == o))
            .map(|c| {
                c.quantity = quantity;
                c.clone()
            }))
    }

    async fn delete(
        &self,
        id: CartItemId,
        owner: Option<UserId>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        if tables.fail_cart_deletes {
            return Err(injected());
        }
        let before = tables.cart.len();
        tables
            .cart
            .retain(|c| !(c.id == id && owner.is_none_or(|o| c.user_id == o)));
        Ok(tables.cart.len() < before)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .lock()
            .orders
            .iter()
            .filter(|o| owner.is_none_or(|id| o.user_id == id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.id.as_i32().cmp(&a.id.as_i32()));
        Ok(orders)
    }

    async fn insert(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.lock();
        if let Some(remaining) = tables.order_inserts_before_failure {
            if remaining == 0 {
                return Err(injected());
            }
            tables.order_inserts_before_failure = Some(remaining - 1);
        }
        if tables.user(order.user_id).is_none() {
            return Err(unknown_reference());
        }

        let created = Order {
            id: OrderId::new(tables.next_id()),
            user_id: order.user_id,
            user_name: order.user_name.clone(),
            user_email: order.user_email.clone(),
            status: order.status.clone(),
            total_amount: order.total_amount,
            product_id: Some(order.product_id),
            product_name: order.product_name.clone(),
            quantity: order.quantity,
            unit_price: order.unit_price,
            size: order.size.clone(),
            product_category_id: order.product_category_id,
            product_category_name: order.product_category_name.clone(),
            design_category_id: order.design_category_id,
            design_category_name: order.design_category_name.clone(),
            phone_number: order.phone_number.clone(),
            alt_phone_number: order.alt_phone_number.clone(),
            address: order.address.clone(),
            city: order.city.clone(),
            created_at: Utc::now(),
        };
        tables.orders.push(created.clone());
        Ok(created)
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.lock();
        Ok(tables.orders.iter_mut().find(|o| o.id == id).map(|o| {
            o.status = status.clone();
            o.clone()
        }))
    }

    async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.orders.len();
        tables.orders.retain(|o| o.id != id);
        Ok(tables.orders.len() < before)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let tables = self.lock();
        let mut reviews: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| Review {
                id: r.id,
                user_id: r.user_id,
                product_id: r.product_id,
                reviewer_name: tables
                    .user(r.user_id)
                    .map(|u| u.user.full_name.clone())
                    .unwrap_or_default(),
                rating: r.rating,
                comment: r.comment.clone(),
                created_at: r.created_at,
            })
            .collect();
        reviews.sort_by(|a, b| b.id.as_i32().cmp(&a.id.as_i32()));
        Ok(reviews)
    }

    async fn insert(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let mut tables = self.lock();
        let Some(reviewer_name) = tables.user(review.user_id).map(|u| u.user.full_name.clone())
        else {
            return Err(unknown_reference());
        };
        if !tables.products.iter().any(|p| p.id == review.product_id) {
            return Err(unknown_reference());
        }

        let stored = StoredReview {
            id: ReviewId::new(tables.next_id()),
            user_id: review.user_id,
            product_id: review.product_id,
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: Utc::now(),
        };
        let created = Review {
            id: stored.id,
            user_id: stored.user_id,
            product_id: stored.product_id,
            reviewer_name,
            rating: stored.rating,
            comment: stored.comment.clone(),
            created_at: stored.created_at,
        };
        tables.reviews.push(stored);
        Ok(created)
    }

    async fn delete(&self, id: ReviewId, owner: Option<UserId>) -> Result<bool, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.reviews.len();
        tables
            .reviews
            .retain(|r| !(r.id == id && owner.is_none_or(|o| r.user_id == o)));
        Ok(tables.reviews.len() < before)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Notification>, RepositoryError> {
        let mut notifications = self.lock().notifications.clone();
        notifications.sort_by(|a, b| b.id.as_i32().cmp(&a.id.as_i32()));
        Ok(notifications)
    }

    async fn insert(&self, message: &str) -> Result<Notification, RepositoryError> {
        let mut tables = self.lock();
        let notification = Notification {
            id: NotificationId::new(tables.next_id()),
            message: message.to_owned(),
            created_at: Utc::now(),
        };
        tables.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let mut tables = self.lock();
        let removed = tables.notifications.len() as u64;
        tables.notifications.clear();
        Ok(removed)
    }
}
