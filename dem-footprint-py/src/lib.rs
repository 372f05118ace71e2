use ::dem_footprint::overlay::OverlayStyle;
use ::dem_footprint::{
    create_outline, create_overlap, Emission, FootprintConfig, FootprintError,
};
use pyo3::prelude::*;
use std::path::{Path, PathBuf};

#[pymodule]
fn dem_footprint(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyOverlayStyle>()?;
    m.add_function(wrap_pyfunction!(create_kml_outline, m)?)?;
    m.add_function(wrap_pyfunction!(get_overlap_kml, m)?)?;
    Ok(())
}

#[pyclass(name = "OverlayStyle")]
#[derive(Clone)]
pub struct PyOverlayStyle {
    #[pyo3(get)]
    pub fill: String,
    #[pyo3(get)]
    pub outline: String,
    #[pyo3(get)]
    pub outline_width: f64,
}

impl From<OverlayStyle> for PyOverlayStyle {
    fn from(style: OverlayStyle) -> Self {
        PyOverlayStyle {
            fill: style.fill.to_kml(style.fill_alpha),
            outline: style.outline.to_kml(255),
            outline_width: style.outline_width,
        }
    }
}

#[pymethods]
impl PyOverlayStyle {
    #[staticmethod]
    fn outline() -> Self {
        OverlayStyle::outline().into()
    }

    #[staticmethod]
    fn overlap() -> Self {
        OverlayStyle::overlap().into()
    }

    fn __repr__(&self) -> String {
        format!(
            "OverlayStyle(fill='{}', outline='{}', outline_width={})",
            self.fill, self.outline, self.outline_width
        )
    }
}

fn to_py_err(e: FootprintError) -> PyErr {
    match e {
        FootprintError::Io { .. } | FootprintError::Write(_) => {
            PyErr::new::<pyo3::exceptions::PyIOError, _>(e.to_string())
        }
        FootprintError::NoUsableShape(_) | FootprintError::InvalidArgument(_) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
        }
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()),
    }
}

/// 保存した場合はファイルパス、保存しない場合はKML文字列を返す
fn emission_to_string(emission: Emission) -> PyResult<String> {
    match emission {
        Emission::Saved(path) => Ok(path.display().to_string()),
        Emission::InMemory(doc) => doc.to_kml_string().map_err(to_py_err),
    }
}

#[pyfunction]
#[pyo3(signature = (file, save=false, output_dir=".", dilations=2))]
pub fn create_kml_outline(file: &str, save: bool, output_dir: &str, dilations: u32) -> PyResult<String> {
    let config = FootprintConfig::default().with_dilation_iterations(dilations);
    let save_dir = save.then(|| Path::new(output_dir));

    let emission = create_outline(Path::new(file), save_dir, &config).map_err(to_py_err)?;
    emission_to_string(emission)
}

#[pyfunction]
#[pyo3(signature = (dems, save=false, output_dir=".", dilations=2))]
pub fn get_overlap_kml(
    dems: Vec<String>,
    save: bool,
    output_dir: &str,
    dilations: u32,
) -> PyResult<Option<String>> {
    let config = FootprintConfig::default().with_dilation_iterations(dilations);
    let save_dir = save.then(|| Path::new(output_dir));
    let paths: Vec<PathBuf> = dems.iter().map(PathBuf::from).collect();

    match create_overlap(&paths, save_dir, &config).map_err(to_py_err)? {
        Some(emission) => emission_to_string(emission).map(Some),
        None => Ok(None),
    }
}
