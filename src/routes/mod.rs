use actix_web::web;

pub mod editors;
pub mod reference;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(reference::configure)
            .configure(editors::configure),
    );
}
