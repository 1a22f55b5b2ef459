use actix_web::HttpRequest;
use palmistry_image_store::store::ImageStore;

#[derive(Debug, Clone)]
pub struct ApiState {
    pub image_store: ImageStore,
    pub public_base_url: Option<String>,
}

impl ApiState {
    pub fn new(image_store: ImageStore, public_base_url: Option<String>) -> Self {
        let public_base_url = public_base_url.map(|mut url| {
            while url.ends_with('/') {
                url.pop();
            }
            url
        });
        Self {
            image_store,
            public_base_url,
        }
    }

    /// Origin the analysis backend should use to reach this server.
    pub fn base_url_for(&self, req: &HttpRequest) -> String {
        match &self.public_base_url {
            Some(url) => url.clone(),
            None => {
                let info = req.connection_info();
                format!("{}://{}", info.scheme(), info.host())
            }
        }
    }

    pub fn image_url(&self, req: &HttpRequest, image_id: &str) -> String {
        format!("{}/api/image/{}", self.base_url_for(req), image_id)
    }
}
