//! Raw asset bytes, cross-platform.
//!
//! Native builds treat asset URLs as filesystem paths (with an `assets/`
//! fallback for relative names); wasm builds fetch relative to the page
//! origin. Networked delivery beyond a plain fetch is out of scope.

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> reqwest::Url {
    let window = web_sys::window().unwrap();
    let location = window.location();
    let origin = location.origin().unwrap();
    let base = reqwest::Url::parse(&format!("{}/", origin)).unwrap();
    base.join(file_name).unwrap()
}

#[cfg(not(target_arch = "wasm32"))]
fn resolve_path(file_name: &str) -> std::path::PathBuf {
    let direct = std::path::PathBuf::from(file_name);
    if direct.exists() {
        direct
    } else {
        std::path::Path::new("assets").join(file_name)
    }
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        if file_name.starts_with("http://") || file_name.starts_with("https://") {
            reqwest::get(file_name).await?.text().await?
        } else {
            reqwest::get(format_url(file_name)).await?.text().await?
        }
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = tokio::fs::read_to_string(resolve_path(file_name)).await?;

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        if file_name.starts_with("http://") || file_name.starts_with("https://") {
            reqwest::get(file_name).await?.bytes().await?.to_vec()
        } else {
            reqwest::get(format_url(file_name)).await?.bytes().await?.to_vec()
        }
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(resolve_path(file_name)).await?;

    Ok(data)
}
