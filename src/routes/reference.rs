use actix_web::web;

use crate::handlers::reference;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/schedules", web::get().to(reference::get_schedules))
        .route("/employees", web::get().to(reference::get_employees))
        .route("/shift-types", web::get().to(reference::get_shift_types));
}
