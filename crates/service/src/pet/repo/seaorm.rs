use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set, UpdateMany,
};
use uuid::Uuid;

use models::{breed, pet, user};

use crate::errors::ServiceError;
use crate::pagination::{PageMeta, Paginated};
use crate::pet::domain::{BreedRef, NewPet, Pet, PetChanges, PetView, Populate, UserRef};
use crate::pet::query::{PetFilter, PetQuery, SearchField, SortDirection, SortField, SortSpec};
use crate::pet::repository::PetRepository;

/// SeaORM-backed repository implementation.
pub struct SeaOrmPetRepository {
    pub db: DatabaseConnection,
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn apply_filter(select: Select<pet::Entity>, filter: &PetFilter) -> Select<pet::Entity> {
    let mut cond = Condition::all();
    if let Some(v) = filter.is_approved { cond = cond.add(pet::Column::IsApproved.eq(v)); }
    if let Some(v) = filter.is_adopted { cond = cond.add(pet::Column::IsAdopted.eq(v)); }
    if let Some(v) = &filter.name { cond = cond.add(pet::Column::Name.eq(v.clone())); }
    if let Some(v) = filter.breed { cond = cond.add(pet::Column::BreedId.eq(v)); }
    if let Some(v) = filter.owner { cond = cond.add(pet::Column::OwnerId.eq(v)); }
    if let Some(v) = filter.submitted_by { cond = cond.add(pet::Column::SubmittedBy.eq(v)); }
    if let Some(v) = &filter.gender { cond = cond.add(pet::Column::Gender.eq(v.clone())); }
    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        let mut any = Condition::any();
        for field in &filter.search_fields {
            let col = match field {
                SearchField::Name => pet::Column::Name,
            };
            any = any.add(
                Expr::expr(Func::lower(Expr::col((pet::Entity, col))))
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            );
        }
        cond = cond.add(any);
    }
    select.filter(cond)
}

fn apply_sort(select: Select<pet::Entity>, sort: SortSpec) -> Select<pet::Entity> {
    let col = match sort.field {
        SortField::CreatedAt => pet::Column::CreatedAt,
        SortField::UpdatedAt => pet::Column::UpdatedAt,
        SortField::Name => pet::Column::Name,
        SortField::Age => pet::Column::Age,
    };
    let order = match sort.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };
    select.order_by(col, order).order_by(pet::Column::Id, Order::Asc)
}

impl SeaOrmPetRepository {
    async fn views(&self, pets: Vec<Pet>, populate: &[Populate]) -> Result<Vec<PetView>, ServiceError> {
        let user_ids = PetView::user_ids(&pets, populate);
        let breed_ids = PetView::breed_ids(&pets, populate);

        let users: HashMap<Uuid, UserRef> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(user_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|u| (u.id, UserRef::from(u)))
                .collect()
        };
        let breeds: HashMap<Uuid, BreedRef> = if breed_ids.is_empty() {
            HashMap::new()
        } else {
            breed::Entity::find()
                .filter(breed::Column::Id.is_in(breed_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|b| (b.id, BreedRef::from(b)))
                .collect()
        };

        Ok(pets.into_iter().map(|p| PetView::resolve(p, populate, &users, &breeds)).collect())
    }

    /// Run a guarded single-statement update; zero affected rows means the
    /// guard failed (or the pet is gone).
    async fn guarded(&self, id: Uuid, stmt: UpdateMany<pet::Entity>) -> Result<Option<Pet>, ServiceError> {
        let res = stmt
            .col_expr(pet::Column::UpdatedAt, Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())))
            .filter(pet::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}

#[async_trait::async_trait]
impl PetRepository for SeaOrmPetRepository {
    async fn insert(&self, new: NewPet) -> Result<Pet, ServiceError> {
        let now = Utc::now().into();
        let am = pet::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name.trim().to_string()),
            breed_id: Set(new.breed),
            age: Set(new.age),
            gender: Set(new.gender),
            description: Set(new.description),
            image_url: Set(new.image_url),
            is_approved: Set(new.is_approved),
            is_adopted: Set(false),
            owner_id: Set(new.owner),
            submitted_by: Set(new.submitted_by),
            adoption_requests: Set(Vec::new()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(am.insert(&self.db).await?.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Pet>, ServiceError> {
        Ok(pet::Entity::find_by_id(id).one(&self.db).await?.map(Pet::from))
    }

    async fn update(&self, id: Uuid, changes: PetChanges) -> Result<Option<Pet>, ServiceError> {
        let Some(found) = pet::Entity::find_by_id(id).one(&self.db).await? else { return Ok(None) };
        let mut am: pet::ActiveModel = found.into();
        if let Some(n) = changes.name { am.name = Set(n.trim().to_string()); }
        if let Some(b) = changes.breed { am.breed_id = Set(Some(b)); }
        if let Some(a) = changes.age { am.age = Set(Some(a)); }
        if let Some(g) = changes.gender { am.gender = Set(Some(g)); }
        if let Some(d) = changes.description { am.description = Set(Some(d)); }
        am.image_url = Set(changes.image_url);
        am.updated_at = Set(Utc::now().into());
        match am.update(&self.db).await {
            Ok(updated) => Ok(Some(updated.into())),
            // deleted between the read and the write
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Pet>, ServiceError> {
        let Some(found) = pet::Entity::find_by_id(id).one(&self.db).await? else { return Ok(None) };
        let res = pet::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        Ok(Some(found.into()))
    }

    async fn find_all(&self, filter: &PetFilter, sort: SortSpec, populate: &[Populate]) -> Result<Vec<PetView>, ServiceError> {
        let rows = apply_sort(apply_filter(pet::Entity::find(), filter), sort).all(&self.db).await?;
        self.views(rows.into_iter().map(Pet::from).collect(), populate).await
    }

    async fn list(&self, query: &PetQuery) -> Result<Paginated<PetView>, ServiceError> {
        let (page_idx, per_page) = query.pagination.normalize(query.max_per_page);
        let select = apply_sort(apply_filter(pet::Entity::find(), &query.filter), query.sort);
        let paginator = select.paginate(&self.db, per_page);
        let totals = paginator.num_items_and_pages().await?;
        let rows = paginator.fetch_page(page_idx).await?;
        let items = self.views(rows.into_iter().map(Pet::from).collect(), &query.populate).await?;
        Ok(Paginated { items, pagination: PageMeta::new(page_idx, per_page, totals.number_of_items) })
    }

    async fn mark_approved(&self, id: Uuid) -> Result<Option<Pet>, ServiceError> {
        let stmt = pet::Entity::update_many()
            .col_expr(pet::Column::IsApproved, Expr::value(true))
            .col_expr(pet::Column::OwnerId, Expr::value(Option::<Uuid>::None))
            .filter(pet::Column::IsApproved.eq(false));
        self.guarded(id, stmt).await
    }

    async fn push_adoption_request(&self, id: Uuid, user_id: Uuid) -> Result<Option<Pet>, ServiceError> {
        let stmt = pet::Entity::update_many()
            .col_expr(
                pet::Column::AdoptionRequests,
                Expr::cust_with_values(r#"array_append("adoption_requests", $1)"#, [user_id]),
            )
            .filter(pet::Column::IsApproved.eq(true))
            .filter(pet::Column::IsAdopted.eq(false))
            .filter(Expr::cust_with_values(r#"NOT ($1 = ANY("adoption_requests"))"#, [user_id]));
        self.guarded(id, stmt).await
    }

    async fn complete_adoption(&self, id: Uuid, user_id: Uuid) -> Result<Option<Pet>, ServiceError> {
        let stmt = pet::Entity::update_many()
            .col_expr(pet::Column::IsAdopted, Expr::value(true))
            .col_expr(pet::Column::OwnerId, Expr::value(Some(user_id)))
            .col_expr(pet::Column::AdoptionRequests, Expr::cust("'{}'::uuid[]"))
            .filter(pet::Column::IsApproved.eq(true))
            .filter(pet::Column::IsAdopted.eq(false))
            .filter(pet::Column::OwnerId.is_null())
            .filter(Expr::cust_with_values(r#"$1 = ANY("adoption_requests")"#, [user_id]));
        self.guarded(id, stmt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    fn new_pet(name: &str, approved: bool, submitter: Option<Uuid>) -> NewPet {
        NewPet {
            name: name.into(),
            breed: None,
            age: Some(1),
            gender: None,
            description: None,
            image_url: vec!["https://cdn.example.com/a.png".into()],
            is_approved: approved,
            owner: submitter,
            submitted_by: submitter,
        }
    }

    #[tokio::test]
    async fn pet_repository_guarded_writes() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmPetRepository { db: db.clone() };

        let submitter = user::create(&db, &format!("repo_{}@example.com", Uuid::new_v4()), "Submitter").await?;
        let adopter = user::create(&db, &format!("repo_{}@example.com", Uuid::new_v4()), "Adopter").await?;

        let p = repo.insert(new_pet("Guarded", false, Some(submitter.id))).await?;
        assert!(repo.push_adoption_request(p.id, adopter.id).await?.is_none(), "unapproved pets take no requests");

        let approved = repo.mark_approved(p.id).await?.expect("first approval applies");
        assert!(approved.is_approved);
        assert_eq!(approved.owner, None);
        assert!(repo.mark_approved(p.id).await?.is_none(), "second approval is a no-op");

        let requested = repo.push_adoption_request(p.id, adopter.id).await?.expect("request applies");
        assert_eq!(requested.adoption_requests, vec![adopter.id]);
        assert!(repo.push_adoption_request(p.id, adopter.id).await?.is_none(), "duplicate request rejected");

        assert!(repo.complete_adoption(p.id, submitter.id).await?.is_none(), "non-requester cannot adopt");
        let adopted = repo.complete_adoption(p.id, adopter.id).await?.expect("adoption applies");
        assert!(adopted.is_adopted);
        assert_eq!(adopted.owner, Some(adopter.id));
        assert!(adopted.adoption_requests.is_empty());

        let removed = repo.delete(p.id).await?.expect("deleted");
        assert_eq!(removed.id, p.id);
        assert!(repo.find_by_id(p.id).await?.is_none());

        user::hard_delete(&db, submitter.id).await?;
        user::hard_delete(&db, adopter.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn pet_repository_listing_filters_and_populates() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else { return Ok(()) };
        let repo = SeaOrmPetRepository { db: db.clone() };

        let owner = user::create(&db, &format!("list_{}@example.com", Uuid::new_v4()), "Lister").await?;
        let tag = Uuid::new_v4().simple().to_string();
        let a = repo.insert(new_pet(&format!("Alpha{tag}"), true, Some(owner.id))).await?;
        let b = repo.insert(new_pet(&format!("Beta{tag}"), true, Some(owner.id))).await?;
        let hidden = repo.insert(new_pet(&format!("Gamma{tag}"), false, Some(owner.id))).await?;

        let mut filter = PetFilter::approved();
        filter.search_fields = vec![SearchField::Name];
        filter.search = Some(tag.to_uppercase());
        let query = PetQuery {
            filter,
            sort: SortSpec { field: SortField::Name, direction: SortDirection::Desc },
            pagination: crate::pagination::Pagination { page: 1, per_page: 1 },
            max_per_page: 100,
            populate: vec![Populate::Owner, Populate::Breed],
        };
        let page = repo.list(&query).await?;
        assert_eq!(page.pagination.total_items, 2);
        assert_eq!(page.pagination.total_pages, 2);
        assert_eq!(page.items[0].id, b.id);
        assert!(matches!(page.items[0].owner, Some(crate::pet::domain::Ref::Resolved(ref u)) if u.id == owner.id));

        for id in [a.id, b.id, hidden.id] {
            repo.delete(id).await?;
        }
        user::hard_delete(&db, owner.id).await?;
        Ok(())
    }
}
